pub mod api;
pub mod config;
pub mod domain;
pub mod id;
pub mod ops;
pub mod store;
pub mod version;

pub use api::{ApiConfig, ApiError, ErrorPayload, HttpApi, NotePayload, RequestConfig};
pub use domain::{Counselor, Record, SessionNote};
pub use store::{CounselorStore, SessionNoteStore};
