//! Health check

use serde_json::Value;

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;

pub async fn health(client: &ApiClient) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::get("/api/healthz"))
        .await
}
