//! Board endpoints and the optimistic like flow

use serde_json::{json, Value};

use super::normalize;
use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;
use crate::optimistic::{optimistic, MutationOutcome, StateCell};

pub use super::types::Post;

pub async fn posts(client: &ApiClient) -> Result<Vec<Post>, ApiError> {
    let payload = client
        .send_value(RequestDescriptor::get("/api/board/posts"))
        .await?;
    normalize::list_items(payload)
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| ApiError::Protocol(format!("unexpected post shape: {e}")))
        })
        .collect()
}

pub async fn create_post(client: &ApiClient, title: &str, content: &str) -> Result<Post, ApiError> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::Validation(
            "title and content are required".to_string(),
        ));
    }
    client
        .send(
            RequestDescriptor::post("/api/board/posts")
                .body(json!({ "title": title, "content": content })),
        )
        .await
}

pub async fn post(client: &ApiClient, post_id: i64) -> Result<Post, ApiError> {
    client
        .send(RequestDescriptor::get(format!("/api/board/posts/{post_id}")))
        .await
}

pub async fn update_post(client: &ApiClient, post_id: i64, data: Value) -> Result<Post, ApiError> {
    client
        .send(RequestDescriptor::patch(format!("/api/board/posts/{post_id}")).body(data))
        .await
}

pub async fn delete_post(client: &ApiClient, post_id: i64) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::delete(format!(
            "/api/board/posts/{post_id}"
        )))
        .await
}

pub async fn like_on(client: &ApiClient, post_id: i64) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::post(format!(
            "/api/board/posts/{post_id}/like"
        )))
        .await
}

pub async fn like_off(client: &ApiClient, post_id: i64) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::delete(format!(
            "/api/board/posts/{post_id}/like"
        )))
        .await
}

/// Drive a post toward the given like state optimistically
///
/// The flag and counter flip immediately; on success any authoritative
/// `likeNum`/`liked` the server returns wins over the local guess; on
/// failure the whole board snapshot is restored. A post already in the
/// target state short-circuits without a request.
pub async fn set_like(
    client: &ApiClient,
    board: &StateCell<Vec<Post>>,
    post_id: i64,
    liked: bool,
) -> Result<MutationOutcome<Value>, ApiError> {
    optimistic(
        board,
        |posts| posts.iter().any(|p| p.id == post_id && p.liked != liked),
        |posts| {
            for post in posts.iter_mut().filter(|p| p.id == post_id) {
                post.liked = liked;
                post.likes_num += if liked { 1 } else { -1 };
            }
        },
        || async {
            if liked {
                like_on(client, post_id).await
            } else {
                like_off(client, post_id).await
            }
        },
        |posts, result| {
            let outcome = normalize::like_result(result);
            for post in posts.iter_mut().filter(|p| p.id == post_id) {
                if let Some(count) = outcome.like_num {
                    post.likes_num = count;
                }
                if let Some(flag) = outcome.liked {
                    post.liked = flag;
                }
            }
        },
    )
    .await
}

/// Flip the like state of a post, whatever it currently is
pub async fn toggle_like(
    client: &ApiClient,
    board: &StateCell<Vec<Post>>,
    post_id: i64,
) -> Result<MutationOutcome<Value>, ApiError> {
    let target = {
        let posts = board.get();
        let Some(current) = posts.iter().find(|p| p.id == post_id) else {
            return Err(ApiError::Validation(format!("unknown post {post_id}")));
        };
        !current.liked
    };
    set_like(client, board, post_id, target).await
}
