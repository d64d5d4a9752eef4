//! Quiz endpoints

use serde_json::{json, Value};

use super::{encode_segment, normalize};
use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;

pub use super::types::{QuizQuestion, QuizSet};

pub async fn keywords(client: &ApiClient) -> Result<Vec<String>, ApiError> {
    let payload = client
        .send_value(RequestDescriptor::get("/api/quiz/keywords"))
        .await?;
    Ok(normalize::string_list(payload))
}

pub async fn create_set(client: &ApiClient, keyword: Option<&str>) -> Result<QuizSet, ApiError> {
    let path = match keyword {
        Some(keyword) => format!("/api/quiz?keyword={}", encode_segment(keyword)),
        None => "/api/quiz".to_string(),
    };
    client.send(RequestDescriptor::get(path)).await
}

pub async fn submit_answer(
    client: &ApiClient,
    quiz_id: &str,
    question_id: i64,
    choice: usize,
    keyword: Option<&str>,
) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::post("/api/quiz/answer").body(json!({
            "quizId": quiz_id,
            "questionId": question_id,
            "choice": choice,
            "keyword": keyword,
        })))
        .await
}

pub async fn result(client: &ApiClient, result_id: &str) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::get(format!(
            "/api/quiz/results/{}",
            encode_segment(result_id)
        )))
        .await
}
