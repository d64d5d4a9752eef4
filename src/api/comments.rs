//! Comment endpoints

use serde_json::{json, Value};

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;

pub use super::types::Comment;

pub async fn create(client: &ApiClient, post_id: i64, content: &str) -> Result<Comment, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::Validation("comment is empty".to_string()));
    }
    client
        .send(
            RequestDescriptor::post(format!("/api/board/posts/{post_id}/comments"))
                .body(json!({ "content": content })),
        )
        .await
}

pub async fn update(client: &ApiClient, comment_id: i64, content: &str) -> Result<Comment, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::Validation("comment is empty".to_string()));
    }
    client
        .send(
            RequestDescriptor::patch(format!("/api/comments/{comment_id}"))
                .body(json!({ "content": content })),
        )
        .await
}

pub async fn delete(client: &ApiClient, comment_id: i64) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::delete(format!(
            "/api/comments/{comment_id}"
        )))
        .await
}
