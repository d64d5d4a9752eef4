//! Profile endpoints

use serde_json::Value;

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;
use crate::session::UserProfile;

pub async fn me(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.send(RequestDescriptor::get("/api/users/me")).await
}

pub async fn update(client: &ApiClient, data: Value) -> Result<UserProfile, ApiError> {
    client
        .send(RequestDescriptor::patch("/api/users/me").body(data))
        .await
}

pub async fn remove(client: &ApiClient) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::delete("/api/users/me"))
        .await
}

pub async fn change_password(client: &ApiClient, data: Value) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::patch("/api/users/me/change-password").body(data))
        .await
}
