//! State containers for the API-backed collections.
//!
//! Each slice owns its state in a [`Store`]. Every change goes through the
//! slice's pure reducer, one action at a time, and subscribers see whole
//! states only. Asynchronous operations are dispatched as three actions
//! (pending, then fulfilled or rejected) sharing one request id.

use std::{fmt, future::Future, sync::Arc};

use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span};

use crate::id::new_request_id;

pub mod counselor;
pub mod session_note;

pub use counselor::{CounselorAction, CounselorState, CounselorStore};
pub use session_note::{SessionNoteAction, SessionNoteState, SessionNoteStore};

/// A region of state and the pure function that advances it.
pub trait Slice: Clone + Default + Send + Sync + 'static {
    type Action: Send;

    const NAME: &'static str;

    fn action_type(action: &Self::Action) -> String;

    fn reduce(self, action: Self::Action) -> Self;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsyncPhase<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> AsyncPhase<T, E> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// One phase of a dispatched asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncAction<T, E> {
    pub request_id: String,
    pub phase: AsyncPhase<T, E>,
}

impl<T, E> AsyncAction<T, E> {
    pub fn pending(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            phase: AsyncPhase::Pending,
        }
    }

    pub fn fulfilled(request_id: impl Into<String>, value: T) -> Self {
        Self {
            request_id: request_id.into(),
            phase: AsyncPhase::Fulfilled(value),
        }
    }

    pub fn rejected(request_id: impl Into<String>, error: E) -> Self {
        Self {
            request_id: request_id.into(),
            phase: AsyncPhase::Rejected(error),
        }
    }
}

pub struct Store<S: Slice> {
    cell: Arc<watch::Sender<S>>,
}

impl<S: Slice> Store<S> {
    pub fn new(initial: S) -> Self {
        let (cell, _rx) = watch::channel(initial);
        Self {
            cell: Arc::new(cell),
        }
    }

    pub fn snapshot(&self) -> S {
        self.cell.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.cell.subscribe()
    }

    /// Runs the reducer on the current state. Reducers never interleave.
    pub fn dispatch(&self, action: S::Action) {
        debug!(slice = S::NAME, action = %S::action_type(&action), "dispatch");
        self.cell.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.reduce(action);
        });
    }

    /// Dispatches `pending`, awaits `operation`, then dispatches its outcome.
    pub async fn run<T, E, F>(
        &self,
        wrap: impl Fn(AsyncAction<T, E>) -> S::Action,
        operation: F,
    ) -> Result<T, E>
    where
        T: Clone,
        E: Clone + fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        let request_id = new_request_id();
        let span = debug_span!("operation", slice = S::NAME, request_id = %request_id);

        async {
            self.dispatch(wrap(AsyncAction::pending(request_id.clone())));
            match operation.await {
                Ok(value) => {
                    self.dispatch(wrap(AsyncAction::fulfilled(
                        request_id.clone(),
                        value.clone(),
                    )));
                    Ok(value)
                }
                Err(err) => {
                    debug!(%err, "operation rejected");
                    self.dispatch(wrap(AsyncAction::rejected(request_id.clone(), err.clone())));
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<S: Slice> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<S: Slice> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tally {
        total: i64,
        seen: Vec<String>,
        request_ids: Vec<String>,
    }

    enum TallyAction {
        Add(i64),
        Fetch(AsyncAction<i64, String>),
    }

    impl Slice for Tally {
        type Action = TallyAction;

        const NAME: &'static str = "tally";

        fn action_type(action: &Self::Action) -> String {
            match action {
                TallyAction::Add(_) => "tally/add".to_string(),
                TallyAction::Fetch(a) => format!("tally/fetch/{}", a.phase.name()),
            }
        }

        fn reduce(mut self, action: Self::Action) -> Self {
            self.seen.push(Self::action_type(&action));
            match action {
                TallyAction::Add(n) => self.total += n,
                TallyAction::Fetch(a) => {
                    self.request_ids.push(a.request_id);
                    if let AsyncPhase::Fulfilled(n) = a.phase {
                        self.total = n;
                    }
                }
            }
            self
        }
    }

    #[test]
    fn dispatch_applies_reducer_and_notifies() {
        let store = Store::<Tally>::default();
        let mut rx = store.subscribe();

        store.dispatch(TallyAction::Add(2));
        store.dispatch(TallyAction::Add(3));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total, 5);
        assert_eq!(store.snapshot().total, 5);
    }

    #[test]
    fn clones_share_state() {
        let store = Store::<Tally>::default();
        let other = store.clone();
        other.dispatch(TallyAction::Add(7));
        assert_eq!(store.snapshot().total, 7);
    }

    #[tokio::test]
    async fn run_dispatches_pending_then_outcome() {
        let store = Store::<Tally>::default();

        let value = store
            .run(TallyAction::Fetch, async { Ok::<_, String>(41) })
            .await
            .unwrap();
        assert_eq!(value, 41);

        let err = store
            .run(TallyAction::Fetch, async { Err::<i64, _>("boom".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");

        assert_eq!(
            store.snapshot().seen,
            vec![
                "tally/fetch/pending",
                "tally/fetch/fulfilled",
                "tally/fetch/pending",
                "tally/fetch/rejected",
            ]
        );
        assert_eq!(store.snapshot().total, 41);
    }

    #[tokio::test]
    async fn run_tags_phases_of_one_operation_with_one_request_id() {
        let store = Store::<Tally>::default();
        store
            .run(TallyAction::Fetch, async { Ok::<_, String>(1) })
            .await
            .unwrap();
        store
            .run(TallyAction::Fetch, async { Ok::<_, String>(2) })
            .await
            .unwrap();

        let ids = store.snapshot().request_ids;
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[3]);
        assert_ne!(ids[0], ids[2]);
        assert!(ulid::Ulid::from_string(&ids[0]).is_ok());
    }
}
