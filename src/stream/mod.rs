//! Cancellable token stream for the chat endpoint
//!
//! A distinct transport mode from the request/response dispatcher: the
//! server produces `data:`-framed increments terminated by a `[DONE]`
//! sentinel, and the consumer surfaces them as a lazy, finite stream of
//! text tokens. Cancellation is cooperative and clean: after the handle
//! fires, no further tokens are yielded and the stream terminates without
//! an error, so callers can release "in progress" UI state deterministically.

mod sse;

pub use sse::SseDecoder;

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ApiError;
use crate::transport::{Transport, TransportRequest};

/// End-of-stream sentinel payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Parameters for one chat stream
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topk: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friend_style: Option<String>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation handle for one stream
///
/// Cloneable so the UI can keep one while the consumer task holds another.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Raise the signal; idempotent
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the signal is raised
    pub(crate) async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy, finite, non-restartable sequence of text increments
///
/// Yields `Ok(token)` per decoded delta in arrival order. Termination is
/// the completion signal and happens exactly once: after `[DONE]`, after
/// cancellation, or after a single `Err` item for a transport or decode
/// failure.
pub struct ChatStream {
    inner: ReceiverStream<Result<String, ApiError>>,
}

impl ChatStream {
    pub(crate) fn spawn(
        transport: Arc<dyn Transport>,
        request: TransportRequest,
        cancel: CancelHandle,
    ) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(consume(transport, request, cancel, tx));
        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Collect every remaining token into one string (tests, non-UI callers)
    pub async fn collect_text(mut self) -> Result<String, ApiError> {
        let mut text = String::new();
        while let Some(item) = self.next().await {
            text.push_str(&item?);
        }
        Ok(text)
    }
}

impl Stream for ChatStream {
    type Item = Result<String, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

async fn consume(
    transport: Arc<dyn Transport>,
    request: TransportRequest,
    cancel: CancelHandle,
    tx: mpsc::Sender<Result<String, ApiError>>,
) {
    let mut bytes = match transport.execute_stream(request).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    };

    let mut decoder = SseDecoder::new();
    'read: loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => break 'read,
            next = bytes.next() => match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
                None => break 'read,
            },
        };

        for payload in decoder.feed(&chunk) {
            // Cancellation observed between frames stops everything,
            // including frames already decoded from this chunk
            if cancel.is_cancelled() {
                return;
            }
            if !forward(&tx, &payload).await {
                return;
            }
        }
    }

    if !cancel.is_cancelled() {
        for payload in decoder.flush() {
            if !forward(&tx, &payload).await {
                return;
            }
        }
    }
}

/// Returns false when the stream is finished: sentinel reached, frame
/// undecodable, or the receiver went away.
async fn forward(tx: &mpsc::Sender<Result<String, ApiError>>, payload: &str) -> bool {
    if payload == DONE_SENTINEL {
        return false;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(frame) => {
            if let Some(delta) = frame.get("delta").and_then(|d| d.as_str()) {
                if !delta.is_empty() && tx.send(Ok(delta.to_string())).await.is_err() {
                    return false;
                }
            }
            true
        }
        Err(e) => {
            let _ = tx
                .send(Err(ApiError::Protocol(format!(
                    "malformed stream frame: {e}"
                ))))
                .await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent_and_observable() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.clone().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_signal() {
        let handle = CancelHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        handle.cancel();
        task.await.unwrap();
    }

    #[test]
    fn test_chat_request_serialization_skips_absent_fields() {
        let body = serde_json::to_string(&ChatRequest::new("생리 주기는?")).unwrap();
        assert!(body.contains("query"));
        assert!(!body.contains("topk"));
        assert!(!body.contains("friendStyle"));

        let request = ChatRequest {
            query: "q".to_string(),
            topk: Some(3),
            friend_style: Some("반말".to_string()),
        };
        let body = serde_json::to_string(&request).unwrap();
        assert!(body.contains("\"topk\":3"));
        assert!(body.contains("friendStyle"));
    }
}
