//! Durable session storage and hydration on startup

use std::sync::Arc;

use seongkeum_client::session::{
    AuthStatus, FileSessionStore, Session, SessionContext, SessionStore,
};
use seongkeum_client::SessionPatch;

fn store_in(dir: &tempfile::TempDir) -> Arc<FileSessionStore> {
    Arc::new(FileSessionStore::at_path(dir.path().join("session.json")))
}

#[tokio::test]
async fn hydrate_restores_a_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .save(&Session {
            access_token: Some("at".to_string()),
            refresh_token: Some("rt".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let ctx = SessionContext::with_store(store);
    assert_eq!(ctx.status(), AuthStatus::Loading);

    ctx.hydrate().await;
    assert_eq!(ctx.status(), AuthStatus::Authenticated);
    assert_eq!(ctx.state().session.access_token.as_deref(), Some("at"));
}

#[tokio::test]
async fn hydrate_with_nothing_stored_settles_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SessionContext::with_store(store_in(&dir));

    ctx.hydrate().await;
    assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn mutations_write_through_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let ctx = SessionContext::with_store(store.clone());
    ctx.hydrate().await;

    ctx.apply(SessionPatch::new().access_token("a"));
    ctx.apply(SessionPatch::new().refresh_token("b"));
    ctx.flush().await;

    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.access_token.as_deref(), Some("a"));
    assert_eq!(saved.refresh_token.as_deref(), Some("b"));
}

#[tokio::test]
async fn clear_removes_the_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let ctx = SessionContext::with_store(store.clone());
    ctx.hydrate().await;

    ctx.apply(SessionPatch::new().access_token("a"));
    ctx.flush().await;
    assert!(store.load().await.unwrap().is_some());

    ctx.clear();
    ctx.flush().await;
    assert!(store.load().await.unwrap().is_none());
    assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn a_second_context_picks_up_what_the_first_persisted() {
    let dir = tempfile::tempdir().unwrap();

    let first = SessionContext::with_store(store_in(&dir));
    first.hydrate().await;
    first.apply(
        SessionPatch::new()
            .access_token("at")
            .refresh_token("rt")
            .access_token_expires_at(1_900_000_000),
    );
    first.flush().await;

    let second = SessionContext::with_store(store_in(&dir));
    second.hydrate().await;
    let session = second.state().session;
    assert_eq!(session.access_token.as_deref(), Some("at"));
    assert_eq!(session.access_token_expires_at, Some(1_900_000_000));
}

#[tokio::test]
async fn subscribers_see_every_transition() {
    let ctx = SessionContext::new();
    let mut rx = ctx.subscribe();

    ctx.apply(SessionPatch::new().access_token("at"));
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status(), AuthStatus::Authenticated);

    ctx.clear();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status(), AuthStatus::Unauthenticated);
}
