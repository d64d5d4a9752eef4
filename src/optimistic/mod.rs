//! Optimistic local mutations with reconcile-or-rollback
//!
//! Every mutating call site follows the same shape: snapshot the local
//! state, apply the intended end-state synchronously so the UI reflects the
//! action with zero latency, issue the authoritative request, then either
//! reconcile with the server's answer or restore the snapshot verbatim.

use std::future::Future;

use tokio::sync::watch;

use crate::error::ApiError;

/// Shared observable local state, standing in for a screen's UI state
///
/// Cheap to clone; clones share the same underlying state and subscribers.
#[derive(Clone)]
pub struct StateCell<S> {
    tx: watch::Sender<S>,
}

impl<S: Clone> StateCell<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Current snapshot
    pub fn get(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Replace the state wholesale
    pub fn set(&self, value: S) {
        self.tx.send_replace(value);
    }

    /// Mutate in place; subscribers are notified
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    /// Observe every state change
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

/// What an optimistic mutation did
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The request was issued and the local state reconciled
    Committed(T),
    /// The precondition was already false locally; nothing happened
    Skipped,
}

impl<T> MutationOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, MutationOutcome::Skipped)
    }
}

/// Run one optimistic mutation against a cell
///
/// Steps, in order:
/// 1. snapshot the current state;
/// 2. check `precondition` against the snapshot; if it is already false
///    (already owned, already liked, balance too low), short-circuit with
///    [`MutationOutcome::Skipped`] before touching anything;
/// 3. apply the optimistic end-state synchronously;
/// 4. await `commit`; on success run `reconcile`, which should prefer
///    server-provided fields over the optimistic guess;
/// 5. on failure restore the snapshot verbatim and re-surface the error.
///
/// Concurrent mutations on the *same* entity are last-writer-wins: each
/// call snapshots whatever state exists when it starts, so a later rollback
/// can restore a snapshot taken before an earlier mutation resolved. Calls
/// on different entities interleave safely since each carries its own
/// snapshot.
pub async fn optimistic<S, T, Fut>(
    cell: &StateCell<S>,
    precondition: impl FnOnce(&S) -> bool,
    apply: impl FnOnce(&mut S),
    commit: impl FnOnce() -> Fut,
    reconcile: impl FnOnce(&mut S, &T),
) -> Result<MutationOutcome<T>, ApiError>
where
    S: Clone,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let previous = cell.get();
    if !precondition(&previous) {
        return Ok(MutationOutcome::Skipped);
    }

    cell.update(apply);

    match commit().await {
        Ok(result) => {
            cell.update(|state| reconcile(state, &result));
            Ok(MutationOutcome::Committed(result))
        }
        Err(e) => {
            cell.set(previous);
            Err(e)
        }
    }
}
