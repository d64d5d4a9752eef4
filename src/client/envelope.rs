//! Response envelope normalization
//!
//! The server is inconsistent about its outer shape: some endpoints wrap
//! the payload in `{status, message, data}`, others return the domain
//! payload bare. Callers of the dispatcher never see the envelope; they get
//! the unwrapped payload or an error carrying the server's message.

use crate::error::ApiError;
use serde_json::{json, Value};

/// Unwrap the envelope: `data` when present and non-null, otherwise the
/// whole parsed body, otherwise an empty object. A caller never receives
/// null in place of a record.
pub(crate) fn unwrap_payload(parsed: Option<Value>) -> Value {
    match parsed {
        Some(value) => match value.get("data") {
            Some(data) if !data.is_null() => data.clone(),
            _ => {
                if value.is_null() {
                    json!({})
                } else {
                    value
                }
            }
        },
        None => json!({}),
    }
}

/// Error for a rejected response, preferring the server's `message` (outer
/// first, then inside `data`) over the templated fallback
pub(crate) fn failure(status: u16, envelope: Option<Value>) -> ApiError {
    let message = envelope
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("data").and_then(|d| d.get("message")))
        })
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed (HTTP {status})"));

    ApiError::Http {
        status,
        message,
        envelope,
    }
}
