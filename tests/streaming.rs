//! Cancellable chat stream behavior over a hand-fed byte channel

mod common;

use std::sync::Arc;

use common::StreamTransport;
use futures::StreamExt;
use seongkeum_client::session::NoopSession;
use seongkeum_client::stream::ChatRequest;
use seongkeum_client::{ApiClient, ApiError, ClientConfig};

fn chat_client(transport: Arc<StreamTransport>) -> ApiClient {
    ApiClient::new(ClientConfig::default(), transport, Arc::new(NoopSession))
}

#[tokio::test]
async fn tokens_arrive_in_order_then_the_stream_ends() {
    common::init_tracing();
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (mut stream, _cancel) = client.stream_chat(&ChatRequest::new("what is consent")).unwrap();

    tx.send(Ok(
        b"data: {\"delta\":\"He\"}\n\ndata: {\"delta\":\"llo\"}\n\ndata: [DONE]\n\n".to_vec(),
    ))
    .await
    .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), "He");
    assert_eq!(stream.next().await.unwrap().unwrap(), "llo");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn frames_split_across_chunks_reassemble() {
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (stream, _cancel) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    tx.send(Ok(b"data: {\"del".to_vec())).await.unwrap();
    tx.send(Ok(b"ta\":\"Hel".to_vec())).await.unwrap();
    tx.send(Ok(b"lo\"}\n\n".to_vec())).await.unwrap();
    drop(tx);

    assert_eq!(stream.collect_text().await.unwrap(), "Hello");
}

#[tokio::test]
async fn trailing_frame_without_newline_is_flushed_at_eof() {
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (stream, _cancel) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    tx.send(Ok(b"data: {\"delta\":\"first\"}\n\n".to_vec()))
        .await
        .unwrap();
    tx.send(Ok(b"data: {\"delta\":\" last\"}".to_vec()))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(stream.collect_text().await.unwrap(), "first last");
}

#[tokio::test]
async fn cancellation_suppresses_later_tokens_and_terminates() {
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (mut stream, cancel) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    tx.send(Ok(b"data: {\"delta\":\"He\"}\n\n".to_vec()))
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "He");

    cancel.cancel();
    assert!(cancel.is_cancelled());

    // Frames arriving after cancellation never surface
    let _ = tx.send(Ok(b"data: {\"delta\":\"llo\"}\n\n".to_vec())).await;
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn transport_failure_surfaces_one_error_then_ends() {
    let (transport, _tx) = StreamTransport::new();
    let client = chat_client(transport);

    // The first open consumes the armed stream; the second fails to open
    let (first, _c1) = client.stream_chat(&ChatRequest::new("q")).unwrap();
    drop(first);
    let (mut second, _c2) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    let item = second.next().await.unwrap();
    assert!(matches!(item, Err(ApiError::Network(_))));
    assert!(second.next().await.is_none());
}

#[tokio::test]
async fn malformed_frame_is_a_protocol_error_and_ends_the_stream() {
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (mut stream, _cancel) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    tx.send(Ok(b"data: {\"delta\":\"ok\"}\n\ndata: {not json}\n\n".to_vec()))
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
    let item = stream.next().await.unwrap();
    assert!(matches!(item, Err(ApiError::Protocol(_))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn mid_stream_byte_error_is_forwarded() {
    let (transport, tx) = StreamTransport::new();
    let client = chat_client(transport);
    let (mut stream, _cancel) = client.stream_chat(&ChatRequest::new("q")).unwrap();

    tx.send(Ok(b"data: {\"delta\":\"ok\"}\n\n".to_vec()))
        .await
        .unwrap();
    tx.send(Err(ApiError::Network("connection reset".to_string())))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
    let item = stream.next().await.unwrap();
    assert!(matches!(item, Err(ApiError::Network(_))));
    assert!(stream.next().await.is_none());
}
