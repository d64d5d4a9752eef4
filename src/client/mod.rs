//! Request dispatch and bounded 401 recovery
//!
//! [`ApiClient::send`] is the single entry point every screen-facing call
//! goes through: it resolves the URL, attaches the bearer token, unwraps the
//! response envelope, and, for exactly one class of failure (HTTP 401 with
//! a refresh token on hand), performs one token refresh followed by one
//! retry before surfacing the result.

pub(crate) mod envelope;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{NoopSession, SessionHandle, SessionPatch};
use crate::stream::{CancelHandle, ChatRequest, ChatStream};
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

const REFRESH_PATH: &str = "/api/auth/refresh";

/// One logical request
///
/// `path` may be relative (joined onto the configured base URL) or an
/// absolute `http(s)` URL. A non-string body is serialized as JSON and
/// forces a JSON content type unless a header override says otherwise.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Extra header; overrides any default of the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The session-aware HTTP client
///
/// Holds the transport and a session capability. With [`NoopSession`]
/// (the default) requests go out unauthenticated and refresh results are
/// silently dropped.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionHandle>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionHandle>,
    ) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    /// Client over the production transport without a mounted session
    pub fn with_defaults(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(config, Arc::new(transport), Arc::new(NoopSession)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionHandle> {
        &self.session
    }

    /// Send a request and deserialize the unwrapped payload
    pub async fn send<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let payload = self.send_value(descriptor).await?;
        serde_json::from_value(payload)
            .map_err(|e| ApiError::Protocol(format!("unexpected response shape: {e}")))
    }

    /// Send a request, returning the unwrapped payload as raw JSON
    ///
    /// Recovery protocol: any outcome other than HTTP 401 is final. On 401
    /// with no refresh token the original error is rethrown untouched. On
    /// 401 with a refresh token, exactly one refresh call is made; if it
    /// succeeds the original request is re-issued exactly once and that
    /// outcome is final, even another 401. A failed refresh clears the
    /// session and surfaces [`ApiError::SessionExpired`]. Worst case is
    /// three wire calls per logical request; there is no loop.
    pub async fn send_value(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let err = match self.dispatch(&descriptor).await {
            Ok(payload) => return Ok(payload),
            Err(err) => err,
        };
        if err.status() != Some(401) {
            return Err(err);
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            tracing::debug!(path = %descriptor.path, "401 with no refresh token, giving up");
            return Err(err);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(()) => {
                tracing::debug!(path = %descriptor.path, "session refreshed, retrying once");
                self.dispatch(&descriptor).await
            }
            Err(refresh_err) => {
                tracing::warn!(error = %refresh_err, "token refresh failed, clearing session");
                self.session.clear();
                Err(ApiError::SessionExpired(refresh_err.to_string()))
            }
        }
    }

    /// Open the cancellable token stream for the chat endpoint
    pub fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<(ChatStream, CancelHandle), ApiError> {
        let url = self.resolve_url(&self.config.stream_path)?;
        let body = serde_json::to_string(request)
            .map_err(|e| ApiError::Protocol(format!("failed to serialize chat request: {e}")))?;

        let transport_request = TransportRequest {
            method: Method::POST,
            url,
            headers: vec![
                ("Accept".to_string(), "text/event-stream".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        };

        let cancel = CancelHandle::new();
        let stream = ChatStream::spawn(self.transport.clone(), transport_request, cancel.clone());
        Ok((stream, cancel))
    }

    /// One wire call: build, execute, unwrap
    async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        let request = self.build_request(descriptor, token.as_deref())?;

        tracing::debug!(method = %descriptor.method, path = %descriptor.path, "dispatching request");
        let response = self.transport.execute(request).await?;

        // Non-JSON bodies are tolerated, not failed
        let parsed: Option<Value> = serde_json::from_str(&response.body).ok();

        let envelope_error = parsed
            .as_ref()
            .and_then(|v| v.get("status"))
            .and_then(|s| s.as_str())
            == Some("error");
        if !(200..300).contains(&response.status) || envelope_error {
            return Err(envelope::failure(response.status, parsed));
        }

        Ok(envelope::unwrap_payload(parsed))
    }

    /// Exchange the refresh token for a fresh access token and write the
    /// rotated fields into the session. The refresh call itself carries no
    /// bearer header.
    async fn refresh_session(&self, refresh_token: &str) -> Result<(), ApiError> {
        let descriptor =
            RequestDescriptor::post(REFRESH_PATH).body(json!({ "refreshToken": refresh_token }));
        let request = self.build_request(&descriptor, None)?;

        let response = self.transport.execute(request).await?;
        let parsed: Option<Value> = serde_json::from_str(&response.body).ok();
        let envelope_error = parsed
            .as_ref()
            .and_then(|v| v.get("status"))
            .and_then(|s| s.as_str())
            == Some("error");
        if !(200..300).contains(&response.status) || envelope_error {
            return Err(envelope::failure(response.status, parsed));
        }

        let payload = envelope::unwrap_payload(parsed);
        let Some(access_token) = payload.get("accessToken").and_then(|v| v.as_str()) else {
            return Err(ApiError::Protocol(
                "refresh response missing accessToken".to_string(),
            ));
        };

        let mut patch = SessionPatch::new().access_token(access_token);
        if let Some(rt) = payload.get("refreshToken").and_then(|v| v.as_str()) {
            patch = patch.refresh_token(rt);
        }
        if let Some(at) = payload.get("accessTokenExpiresAt").and_then(|v| v.as_u64()) {
            patch = patch.access_token_expires_at(at);
        }
        if let Some(rt) = payload.get("refreshTokenExpiresAt").and_then(|v| v.as_u64()) {
            patch = patch.refresh_token_expires_at(rt);
        }
        self.session.apply(patch);
        Ok(())
    }

    fn resolve_url(&self, path: &str) -> Result<Url, ApiError> {
        let lower = path.to_ascii_lowercase();
        let joined;
        let target = if lower.starts_with("http://") || lower.starts_with("https://") {
            path
        } else {
            let base = self.config.base_url.trim_end_matches('/');
            joined = if path.starts_with('/') {
                format!("{base}{path}")
            } else {
                format!("{base}/{path}")
            };
            &joined
        };
        Url::parse(target).map_err(|e| ApiError::Validation(format!("invalid url {target:?}: {e}")))
    }

    /// Header rules: bearer token only when one is present, `Accept` always,
    /// `Content-Type` only alongside a body, descriptor headers override.
    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<TransportRequest, ApiError> {
        let url = self.resolve_url(&descriptor.path)?;

        let body = match &descriptor.body {
            None => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(serde_json::to_string(other).map_err(|e| {
                ApiError::Protocol(format!("failed to serialize request body: {e}"))
            })?),
        };

        let mut headers: Vec<(String, String)> = Vec::new();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers.push(("Accept".to_string(), "application/json".to_string()));
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        for (name, value) in &descriptor.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(TransportRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body,
        })
    }
}
