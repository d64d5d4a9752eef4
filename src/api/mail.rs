//! Mail test endpoint

use serde_json::{json, Value};

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;

pub async fn test_send(
    client: &ApiClient,
    to: &str,
    subject: &str,
    text: &str,
) -> Result<Value, ApiError> {
    if to.trim().is_empty() {
        return Err(ApiError::Validation("recipient is required".to_string()));
    }
    client
        .send_value(RequestDescriptor::post("/api/mail/test").body(json!({
            "to": to,
            "subject": subject,
            "text": text,
        })))
        .await
}
