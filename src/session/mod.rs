//! Session state: tokens, cached profile, persistence, notification
//!
//! The in-memory [`SessionContext`] is the single source of truth for the
//! current session. Mutations merge in synchronously and notify subscribers
//! immediately; persistence to the [`SessionStore`] happens afterward on a
//! background task, so callers never wait on storage I/O.

mod store;

pub use store::{FileSessionStore, SessionStore};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Cached user profile, as returned by `/api/users/me` or the login payload
///
/// Only the fields the client itself branches on are typed; everything else
/// rides along in `extra` so a round trip through storage is lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The current session: opaque token pair, expiries, cached profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds); the server decides the actual lifetime
    pub access_token_expires_at: Option<u64>,
    pub refresh_token_expires_at: Option<u64>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// A session without an access token is unauthenticated, even when a
    /// profile is still cached.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Three-state patch field: omitted fields are left untouched, explicitly
/// cleared fields go to absent, set fields are replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T: Clone> Field<T> {
    fn merge_into(&self, slot: &mut Option<T>) {
        match self {
            Field::Keep => {}
            Field::Clear => *slot = None,
            Field::Set(value) => *slot = Some(value.clone()),
        }
    }
}

/// Partial session update
///
/// A refresh may rotate only the access token; a login sets everything.
/// Fields not mentioned by the patch survive the merge unchanged.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub access_token: Field<String>,
    pub refresh_token: Field<String>,
    pub access_token_expires_at: Field<u64>,
    pub refresh_token_expires_at: Field<u64>,
    pub user: Field<UserProfile>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Field::Set(token.into());
        self
    }

    pub fn clear_access_token(mut self) -> Self {
        self.access_token = Field::Clear;
        self
    }

    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Field::Set(token.into());
        self
    }

    pub fn clear_refresh_token(mut self) -> Self {
        self.refresh_token = Field::Clear;
        self
    }

    pub fn access_token_expires_at(mut self, at: u64) -> Self {
        self.access_token_expires_at = Field::Set(at);
        self
    }

    pub fn refresh_token_expires_at(mut self, at: u64) -> Self {
        self.refresh_token_expires_at = Field::Set(at);
        self
    }

    pub fn user(mut self, user: UserProfile) -> Self {
        self.user = Field::Set(user);
        self
    }

    pub fn clear_user(mut self) -> Self {
        self.user = Field::Clear;
        self
    }

    /// Merge this patch into a session
    pub fn apply_to(&self, session: &mut Session) {
        self.access_token.merge_into(&mut session.access_token);
        self.refresh_token.merge_into(&mut session.refresh_token);
        self.access_token_expires_at
            .merge_into(&mut session.access_token_expires_at);
        self.refresh_token_expires_at
            .merge_into(&mut session.refresh_token_expires_at);
        self.user.merge_into(&mut session.user);
    }
}

/// Snapshot handed to subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// True until the startup read of the store has settled. While loading,
    /// the session is neither authenticated nor unauthenticated and the UI
    /// must not fire mutating requests that depend on the outcome.
    pub loading: bool,
    pub session: Session,
}

/// Authentication status derived from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup restore still in flight
    Loading,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Loading
        } else if self.session.is_authenticated() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }
}

/// Capability handed to the request layer for reading tokens and writing
/// refresh results back. The dispatcher works against this trait, never
/// against a concrete context, so "no context mounted" is just the
/// [`NoopSession`] default.
pub trait SessionHandle: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn apply(&self, patch: SessionPatch);
    fn clear(&self);
}

/// Null-object session: reads yield nothing, writes are dropped
#[derive(Debug, Default)]
pub struct NoopSession;

impl SessionHandle for NoopSession {
    fn access_token(&self) -> Option<String> {
        None
    }

    fn refresh_token(&self) -> Option<String> {
        None
    }

    fn apply(&self, _patch: SessionPatch) {}

    fn clear(&self) {}
}

enum PersistCmd {
    Save(Session),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Process-wide session context
///
/// Subscribers observe every mutation through a watch channel; the durable
/// store is written through on a dedicated task that applies writes in
/// mutation order.
pub struct SessionContext {
    tx: watch::Sender<SessionState>,
    store: Option<Arc<dyn SessionStore>>,
    persist_tx: Option<mpsc::UnboundedSender<PersistCmd>>,
}

impl SessionContext {
    /// In-memory only context (no persistence), immediately settled
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            tx,
            store: None,
            persist_tx: None,
        }
    }

    /// Context backed by a durable store
    ///
    /// The state starts in `loading`; call [`SessionContext::hydrate`] once
    /// at startup to restore the persisted session. Must be created inside a
    /// tokio runtime (the persistence task is spawned here).
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        let (tx, _rx) = watch::channel(SessionState {
            loading: true,
            session: Session::default(),
        });
        let (persist_tx, mut persist_rx) = mpsc::unbounded_channel();

        let writer_store = store.clone();
        tokio::spawn(async move {
            while let Some(cmd) = persist_rx.recv().await {
                match cmd {
                    PersistCmd::Save(session) => {
                        if let Err(e) = writer_store.save(&session).await {
                            tracing::warn!(error = %e, "failed to persist session");
                        }
                    }
                    PersistCmd::Clear => {
                        if let Err(e) = writer_store.clear().await {
                            tracing::warn!(error = %e, "failed to clear persisted session");
                        }
                    }
                    PersistCmd::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Self {
            tx,
            store: Some(store),
            persist_tx: Some(persist_tx),
        }
    }

    /// One-time startup restore from the store
    ///
    /// Whatever happens, the state leaves `loading` when this returns; a
    /// failed read logs and falls back to an empty session.
    pub async fn hydrate(&self) {
        let restored = match &self.store {
            Some(store) => match store.load().await {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to restore session, starting empty");
                    None
                }
            },
            None => None,
        };
        self.tx.send_modify(|state| {
            if let Some(session) = restored {
                state.session = session;
            }
            state.loading = false;
        });
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.tx.borrow().status()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Merge a partial update: in-memory first, subscribers notified,
    /// then the new snapshot is queued for persistence.
    pub fn apply(&self, patch: SessionPatch) {
        self.tx
            .send_modify(|state| patch.apply_to(&mut state.session));
        self.queue(PersistCmd::Save(self.tx.borrow().session.clone()));
    }

    /// Reset every field to absent (logout, terminal refresh failure)
    pub fn clear(&self) {
        tracing::debug!("clearing session");
        self.tx.send_modify(|state| {
            state.session = Session::default();
            state.loading = false;
        });
        self.queue(PersistCmd::Clear);
    }

    /// Wait until all queued persistence work has been applied
    pub async fn flush(&self) {
        if let Some(tx) = &self.persist_tx {
            let (ack_tx, ack_rx) = oneshot::channel();
            if tx.send(PersistCmd::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.await;
            }
        }
    }

    fn queue(&self, cmd: PersistCmd) {
        if let Some(tx) = &self.persist_tx {
            let _ = tx.send(cmd);
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle for SessionContext {
    fn access_token(&self) -> Option<String> {
        self.tx.borrow().session.access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.tx.borrow().session.refresh_token.clone()
    }

    fn apply(&self, patch: SessionPatch) {
        SessionContext::apply(self, patch);
    }

    fn clear(&self) {
        SessionContext::clear(self);
    }
}
