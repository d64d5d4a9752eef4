//! Scripted transports for driving the client without a network

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use seongkeum_client::error::ApiError;
use seongkeum_client::transport::{ByteStream, Transport, TransportRequest, TransportResponse};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Route test traces through the usual subscriber; `RUST_LOG` controls output
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Records every request and answers from a scripted queue
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, ApiError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the next response
    pub fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TransportResponse {
                status,
                body: body.to_string(),
            }));
    }

    /// Queue the next failure
    pub fn fail(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Everything that went over the wire, in order
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("mock transport exhausted".to_string())))
    }

    async fn execute_stream(&self, _request: TransportRequest) -> Result<ByteStream, ApiError> {
        Err(ApiError::Network(
            "mock transport does not stream".to_string(),
        ))
    }
}

/// Hands out one pre-armed byte stream fed through a channel, so tests can
/// pace chunks and interleave cancellation
pub struct StreamTransport {
    stream: Mutex<Option<ByteStream>>,
}

impl StreamTransport {
    pub fn new() -> (Arc<Self>, mpsc::Sender<Result<Vec<u8>, ApiError>>) {
        let (tx, rx) = mpsc::channel(16);
        let stream: ByteStream = ReceiverStream::new(rx).boxed();
        (
            Arc::new(Self {
                stream: Mutex::new(Some(stream)),
            }),
            tx,
        )
    }
}

#[async_trait]
impl Transport for StreamTransport {
    async fn execute(&self, _request: TransportRequest) -> Result<TransportResponse, ApiError> {
        Err(ApiError::Network("stream transport only streams".to_string()))
    }

    async fn execute_stream(&self, _request: TransportRequest) -> Result<ByteStream, ApiError> {
        self.stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ApiError::Network("stream already taken".to_string()))
    }
}
