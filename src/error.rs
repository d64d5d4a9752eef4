//! Typed errors for API operations
//!
//! Provides structured error types so call sites can branch on failure
//! semantics (unauthenticated vs not-found vs transport loss) without
//! string matching.

use thiserror::Error;

/// API operation errors with typed variants
///
/// Enables callers to distinguish between different failure modes:
/// - `Network` - transport-level failure, no response was received
/// - `Http` - response received but rejected (non-2xx, or envelope error)
/// - `Protocol` - a payload arrived but could not be decoded
/// - `SessionExpired` - the refresh call itself failed; the session has
///   already been cleared when this is raised
/// - `Validation` - caller-side precondition failed before any request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, timeout, DNS failure, dropped socket
    #[error("Network error: {0}")]
    Network(String),

    /// Response received, request rejected
    ///
    /// `message` is the server's envelope `message` when present, otherwise
    /// a templated fallback. `envelope` carries the raw parsed body for
    /// callers that need to branch on its contents.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        envelope: Option<serde_json::Value>,
    },

    /// Response body did not decode into the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Token refresh failed; the session was cleared as a side effect
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Rejected before any request was issued (e.g. empty input)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status code, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures the UI should answer with a login prompt:
    /// a surfaced 401, or a terminal refresh failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_)) || self.status() == Some(401)
    }

    /// Classify reqwest transport errors
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network(format!("request timeout: {}", e))
        } else if e.is_connect() {
            ApiError::Network(format!("connection failed: {}", e))
        } else if let Some(status) = e.status() {
            let status = status.as_u16();
            ApiError::Http {
                status,
                message: format!("request failed (HTTP {})", status),
                envelope: None,
            }
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
