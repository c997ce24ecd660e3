use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::error;

use super::{AsyncAction, AsyncPhase, Slice, Store};
use crate::{
    api::{ApiError, ErrorPayload, NotePayload, RequestConfig, SessionNoteApi},
    domain::SessionNote,
};

pub const SESSION_NOTE_SAVED_MESSAGE: &str = "Session note saved successfully!";
pub const CREATE_FALLBACK_MESSAGE: &str = "Failed to create session note";
pub const FETCH_FALLBACK_MESSAGE: &str = "Failed to fetch session notes";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionNoteState {
    pub items: Vec<SessionNote>,
    pub loading: bool,
    pub error: Option<ErrorPayload>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionNoteAction {
    Create(AsyncAction<SessionNote, ErrorPayload>),
    FetchAll(AsyncAction<Vec<SessionNote>, ErrorPayload>),
    ClearSuccessMessage,
}

impl Slice for SessionNoteState {
    type Action = SessionNoteAction;

    const NAME: &'static str = "sessionNotes";

    fn action_type(action: &Self::Action) -> String {
        match action {
            SessionNoteAction::Create(a) => {
                format!("sessionNotes/createSession/{}", a.phase.name())
            }
            SessionNoteAction::FetchAll(a) => {
                format!("sessionNotes/getSessionNotes/{}", a.phase.name())
            }
            SessionNoteAction::ClearSuccessMessage => {
                "sessionNotes/clearSuccessMessage".to_string()
            }
        }
    }

    fn reduce(mut self, action: Self::Action) -> Self {
        match action {
            SessionNoteAction::Create(action) => match action.phase {
                AsyncPhase::Pending => {
                    self.loading = true;
                    self.error = None;
                    self.success_message.clear();
                }
                AsyncPhase::Fulfilled(note) => {
                    self.loading = false;
                    self.items.push(note);
                    self.success_message = SESSION_NOTE_SAVED_MESSAGE.to_string();
                }
                AsyncPhase::Rejected(payload) => self.fail(payload),
            },
            SessionNoteAction::FetchAll(action) => match action.phase {
                AsyncPhase::Pending => {
                    self.loading = true;
                    self.error = None;
                }
                AsyncPhase::Fulfilled(notes) => {
                    self.loading = false;
                    self.items = notes;
                }
                AsyncPhase::Rejected(payload) => self.fail(payload),
            },
            SessionNoteAction::ClearSuccessMessage => self.success_message.clear(),
        }
        self
    }
}

impl SessionNoteState {
    fn fail(&mut self, payload: ErrorPayload) {
        self.loading = false;
        self.error = Some(payload);
    }
}

/// Session-note collection backed by a [`SessionNoteApi`].
///
/// Failures are logged and normalized: the stored error is the server's
/// error body when it sent one, else a fixed fallback message.
#[derive(Clone)]
pub struct SessionNoteStore {
    api: Arc<dyn SessionNoteApi>,
    store: Store<SessionNoteState>,
}

impl SessionNoteStore {
    pub fn new(api: Arc<dyn SessionNoteApi>) -> Self {
        Self {
            api,
            store: Store::default(),
        }
    }

    pub fn state(&self) -> SessionNoteState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionNoteState> {
        self.store.subscribe()
    }

    pub async fn create(
        &self,
        payload: NotePayload,
        config: RequestConfig,
    ) -> Result<SessionNote, ErrorPayload> {
        let request = self.api.create_session_note(payload, config);
        self.store
            .run(SessionNoteAction::Create, async move {
                request.await.map_err(|err| {
                    log_create_failure(&err);
                    ErrorPayload::from_api_error(&err, CREATE_FALLBACK_MESSAGE)
                })
            })
            .await
    }

    pub async fn fetch_all(&self) -> Result<Vec<SessionNote>, ErrorPayload> {
        let request = self.api.list_session_notes();
        self.store
            .run(SessionNoteAction::FetchAll, async move {
                request.await.map_err(|err| {
                    error!(error = %err, "error fetching session notes");
                    ErrorPayload::from_api_error(&err, FETCH_FALLBACK_MESSAGE)
                })
            })
            .await
    }

    pub fn clear_success_message(&self) {
        self.store.dispatch(SessionNoteAction::ClearSuccessMessage);
    }
}

fn log_create_failure(err: &ApiError) {
    match err {
        ApiError::Response {
            status,
            headers,
            body,
        } => {
            let body = body
                .as_ref()
                .map_or_else(|| "<empty>".to_string(), ToString::to_string);
            error!(status, ?headers, %body, "create session note: server responded with error");
        }
        ApiError::NoResponse { request, message } => {
            error!(%request, error = %message, "create session note: no response received");
        }
        ApiError::Request { message } | ApiError::Decode { message } => {
            error!(error = %message, "create session note: request failed");
        }
    }
}
