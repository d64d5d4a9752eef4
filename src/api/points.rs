//! Point balance endpoint

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;

use super::normalize;

/// Current balance; an unrecognized payload counts as zero rather than
/// failing the screen
pub async fn me(client: &ApiClient) -> Result<i64, ApiError> {
    let payload = client
        .send_value(RequestDescriptor::get("/api/points/me"))
        .await?;
    Ok(normalize::balance(&payload).unwrap_or(0))
}
