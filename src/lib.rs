//! seongkeum-client: resilient, session-aware API client for the Seongkeum app
//!
//! This library provides:
//! - Session state with partial merges, durable persistence, and subscriber notification
//! - A JSON request dispatcher that normalizes the server's response envelope
//! - Bounded 401 recovery: exactly one token refresh and one retry per call
//! - A cancellable SSE token stream for the chat endpoint
//! - Optimistic local mutations with reconcile-or-rollback
//! - Typed endpoint groups for auth, board, badges, points, quiz, and profile

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod optimistic;
pub mod session;
pub mod stream;
pub mod transport;

pub use client::{ApiClient, RequestDescriptor};
pub use config::ClientConfig;
pub use error::ApiError;
pub use session::{Session, SessionContext, SessionPatch};
