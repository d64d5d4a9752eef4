//! Authentication endpoints
//!
//! `login` and `logout` are the two calls that write the session context;
//! everything else is plain request/response.

use serde::Deserialize;
use serde_json::{json, Value};

use super::encode_segment;
use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;
use crate::session::{SessionContext, SessionPatch, UserProfile};

/// Token payload from login (and refresh, when called directly)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenPayload {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token_expires_at: Option<u64>,
    pub refresh_token_expires_at: Option<u64>,
    pub user: Option<UserProfile>,
}

impl TokenPayload {
    /// Patch carrying every field the server actually sent
    fn into_patch(self) -> Option<SessionPatch> {
        let access_token = self.access_token?;
        let mut patch = SessionPatch::new().access_token(access_token);
        if let Some(rt) = self.refresh_token {
            patch = patch.refresh_token(rt);
        }
        if let Some(at) = self.access_token_expires_at {
            patch = patch.access_token_expires_at(at);
        }
        if let Some(rt) = self.refresh_token_expires_at {
            patch = patch.refresh_token_expires_at(rt);
        }
        if let Some(user) = self.user {
            patch = patch.user(user);
        }
        Some(patch)
    }
}

pub async fn register(client: &ApiClient, data: Value) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::post("/api/auth/register").body(data))
        .await
}

pub async fn check_nickname(client: &ApiClient, nickname: &str) -> Result<Value, ApiError> {
    if nickname.trim().is_empty() {
        return Err(ApiError::Validation("nickname is required".to_string()));
    }
    client
        .send_value(RequestDescriptor::get(format!(
            "/api/auth/check-nickname?nickname={}",
            encode_segment(nickname)
        )))
        .await
}

/// Log in and mount the resulting tokens and profile into the context
pub async fn login(
    client: &ApiClient,
    ctx: &SessionContext,
    email: &str,
    password: &str,
) -> Result<TokenPayload, ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let payload: TokenPayload = client
        .send(
            RequestDescriptor::post("/api/auth/login")
                .body(json!({ "email": email, "password": password })),
        )
        .await?;

    let Some(patch) = payload.clone().into_patch() else {
        return Err(ApiError::Protocol(
            "login response missing accessToken".to_string(),
        ));
    };
    ctx.apply(patch);
    Ok(payload)
}

/// Log out: tell the server, then drop the local session either way
pub async fn logout(client: &ApiClient, ctx: &SessionContext) -> Result<(), ApiError> {
    let session = ctx.state().session;
    let mut body = serde_json::Map::new();
    if let Some(at) = session.access_token {
        body.insert("accessToken".to_string(), Value::String(at));
    }
    if let Some(rt) = session.refresh_token {
        body.insert("refreshToken".to_string(), Value::String(rt));
    }

    let result = client
        .send_value(RequestDescriptor::post("/api/auth/logout").body(Value::Object(body)))
        .await;

    // Local logout always wins, even when the server call failed
    ctx.clear();
    result.map(|_| ())
}

pub async fn change_password(
    client: &ApiClient,
    current_password: Option<&str>,
    new_password: &str,
    new_password_confirm: &str,
) -> Result<Value, ApiError> {
    if new_password.is_empty() || new_password != new_password_confirm {
        return Err(ApiError::Validation(
            "new passwords must match and not be empty".to_string(),
        ));
    }

    let mut body = serde_json::Map::new();
    if let Some(current) = current_password {
        body.insert(
            "currentPassword".to_string(),
            Value::String(current.to_string()),
        );
    }
    body.insert(
        "newPassword".to_string(),
        Value::String(new_password.to_string()),
    );
    body.insert(
        "newPasswordConfirm".to_string(),
        Value::String(new_password_confirm.to_string()),
    );

    client
        .send_value(
            RequestDescriptor::post("/api/users/me/change-password").body(Value::Object(body)),
        )
        .await
}

pub async fn find_email(
    client: &ApiClient,
    nickname: &str,
    gender: &str,
    birth_year: u16,
) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::post("/api/auth/find-email").body(json!({
            "nickname": nickname,
            "gender": gender,
            "birthYear": birth_year,
            // Some deployments expect the all-lowercase key
            "birthyear": birth_year,
        })))
        .await
}

pub async fn request_temporary_password(client: &ApiClient, email: &str) -> Result<Value, ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::Validation("email is required".to_string()));
    }
    client
        .send_value(RequestDescriptor::post("/api/auth/find-password").body(json!({ "email": email })))
        .await
}

/// Direct refresh call; the dispatcher normally performs this on its own
/// during 401 recovery
pub async fn refresh(client: &ApiClient, refresh_token: &str) -> Result<TokenPayload, ApiError> {
    client
        .send(
            RequestDescriptor::post("/api/auth/refresh")
                .body(json!({ "refreshToken": refresh_token })),
        )
        .await
}
