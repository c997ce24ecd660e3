use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use super::{AsyncAction, AsyncPhase, Slice, Store};
use crate::{
    api::{ApiError, CounselorApi},
    domain::Counselor,
};

pub const COUNSELOR_CREATED_MESSAGE: &str = "Counselor created successfully!";
pub const COUNSELOR_UPDATED_MESSAGE: &str = "Counselor updated successfully!";
pub const COUNSELOR_DELETED_MESSAGE: &str = "Counselor deleted successfully!";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CounselorState {
    pub items: Vec<Counselor>,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub selected: Option<Counselor>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounselorAction {
    FetchAll(AsyncAction<Vec<Counselor>, ApiError>),
    FetchById(AsyncAction<Counselor, ApiError>),
    Create(AsyncAction<Counselor, ApiError>),
    Update(AsyncAction<Counselor, ApiError>),
    /// Fulfilled with the id that was deleted.
    Delete(AsyncAction<String, ApiError>),
    ClearSuccessMessage,
}

impl Slice for CounselorState {
    type Action = CounselorAction;

    const NAME: &'static str = "counselor";

    fn action_type(action: &Self::Action) -> String {
        let (name, phase) = match action {
            CounselorAction::FetchAll(a) => ("fetch", a.phase.name()),
            CounselorAction::FetchById(a) => ("fetchById", a.phase.name()),
            CounselorAction::Create(a) => ("create", a.phase.name()),
            CounselorAction::Update(a) => ("update", a.phase.name()),
            CounselorAction::Delete(a) => ("delete", a.phase.name()),
            CounselorAction::ClearSuccessMessage => {
                return "counselor/clearSuccessMessage".to_string();
            }
        };
        format!("counselor/{name}/{phase}")
    }

    fn reduce(mut self, action: Self::Action) -> Self {
        match action {
            CounselorAction::FetchAll(action) => match action.phase {
                AsyncPhase::Pending => self.begin_fetch(),
                AsyncPhase::Fulfilled(items) => {
                    self.loading = false;
                    self.items = items;
                }
                AsyncPhase::Rejected(err) => self.fail_fetch(err),
            },
            CounselorAction::FetchById(action) => match action.phase {
                AsyncPhase::Pending => self.begin_fetch(),
                AsyncPhase::Fulfilled(counselor) => {
                    self.loading = false;
                    self.selected = Some(counselor);
                }
                AsyncPhase::Rejected(err) => self.fail_fetch(err),
            },
            // Mutations never touch `loading`, in any phase.
            CounselorAction::Create(action) => match action.phase {
                AsyncPhase::Pending => {}
                AsyncPhase::Fulfilled(counselor) => {
                    self.success_message = COUNSELOR_CREATED_MESSAGE.to_string();
                    self.items.push(counselor);
                }
                AsyncPhase::Rejected(err) => self.error = Some(err),
            },
            CounselorAction::Update(action) => match action.phase {
                AsyncPhase::Pending => {}
                AsyncPhase::Fulfilled(counselor) => {
                    self.success_message = COUNSELOR_UPDATED_MESSAGE.to_string();
                    let index = counselor
                        .id()
                        .and_then(|id| self.items.iter().position(|item| item.has_id(id)));
                    if let Some(index) = index {
                        self.items[index] = counselor;
                    }
                }
                AsyncPhase::Rejected(err) => self.error = Some(err),
            },
            CounselorAction::Delete(action) => match action.phase {
                AsyncPhase::Pending => {}
                AsyncPhase::Fulfilled(id) => {
                    self.success_message = COUNSELOR_DELETED_MESSAGE.to_string();
                    self.items.retain(|item| !item.has_id(&id));
                }
                AsyncPhase::Rejected(err) => self.error = Some(err),
            },
            CounselorAction::ClearSuccessMessage => self.success_message.clear(),
        }
        self
    }
}

impl CounselorState {
    fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn fail_fetch(&mut self, err: ApiError) {
        self.loading = false;
        self.error = Some(err);
    }
}

/// Counselor collection backed by a [`CounselorApi`].
///
/// API failures reach the state unchanged: the rejected phase stores the
/// `ApiError` exactly as the API layer produced it.
#[derive(Clone)]
pub struct CounselorStore {
    api: Arc<dyn CounselorApi>,
    store: Store<CounselorState>,
}

impl CounselorStore {
    pub fn new(api: Arc<dyn CounselorApi>) -> Self {
        Self {
            api,
            store: Store::default(),
        }
    }

    pub fn state(&self) -> CounselorState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<CounselorState> {
        self.store.subscribe()
    }

    pub async fn fetch_all(&self) -> Result<Vec<Counselor>, ApiError> {
        self.store
            .run(CounselorAction::FetchAll, self.api.list_counselors())
            .await
    }

    pub async fn fetch_by_id(&self, id: impl Into<String>) -> Result<Counselor, ApiError> {
        self.store
            .run(CounselorAction::FetchById, self.api.get_counselor(id.into()))
            .await
    }

    pub async fn create(&self, data: Map<String, Value>) -> Result<Counselor, ApiError> {
        self.store
            .run(CounselorAction::Create, self.api.create_counselor(data))
            .await
    }

    pub async fn update(
        &self,
        id: impl Into<String>,
        data: Map<String, Value>,
    ) -> Result<Counselor, ApiError> {
        self.store
            .run(
                CounselorAction::Update,
                self.api.update_counselor(id.into(), data),
            )
            .await
    }

    pub async fn delete(&self, id: impl Into<String>) -> Result<String, ApiError> {
        let id = id.into();
        let request = self.api.delete_counselor(id.clone());
        self.store
            .run(CounselorAction::Delete, async move {
                request.await.map(|()| id)
            })
            .await
    }

    pub fn clear_success_message(&self) {
        self.store.dispatch(CounselorAction::ClearSuccessMessage);
    }
}
