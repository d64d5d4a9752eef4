//! Typed endpoint groups
//!
//! Thin per-resource layers over [`crate::ApiClient::send`]: paths, methods,
//! and body shapes mirror the server contract one-to-one, so every call gets
//! the envelope unwrapping, error taxonomy, and 401 recovery for free.

pub mod auth;
pub mod badges;
pub mod board;
pub mod comments;
pub mod mail;
pub mod normalize;
pub mod points;
pub mod quiz;
pub mod system;
pub mod types;
pub mod users;

/// Percent-encode one path/query segment
pub(crate) fn encode_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
