use std::{collections::BTreeMap, future::Future, pin::Pin};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{Counselor, SessionNote};

mod http;
mod request;

pub use http::{ApiConfig, DEFAULT_TIMEOUT, HttpApi};
pub use request::{Encoding, FilePart, NotePayload, RequestConfig};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CounselorApi: Send + Sync + 'static {
    fn list_counselors(&self) -> BoxFuture<'_, Result<Vec<Counselor>, ApiError>>;

    fn get_counselor(&self, id: String) -> BoxFuture<'_, Result<Counselor, ApiError>>;

    fn create_counselor(
        &self,
        data: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Counselor, ApiError>>;

    fn update_counselor(
        &self,
        id: String,
        data: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Counselor, ApiError>>;

    fn delete_counselor(&self, id: String) -> BoxFuture<'_, Result<(), ApiError>>;
}

pub trait SessionNoteApi: Send + Sync + 'static {
    fn create_session_note(
        &self,
        payload: NotePayload,
        config: RequestConfig,
    ) -> BoxFuture<'_, Result<SessionNote, ApiError>>;

    fn list_session_notes(&self) -> BoxFuture<'_, Result<Vec<SessionNote>, ApiError>>;
}

/// Failure of one API call, split by how far the request got.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// The server answered with a non-success status.
    Response {
        status: u16,
        headers: BTreeMap<String, String>,
        body: Option<Value>,
    },
    /// The request went out but no response came back.
    NoResponse { request: String, message: String },
    /// The request could not be built or sent.
    Request { message: String },
    /// A success response whose body was not the expected shape.
    Decode { message: String },
}

impl ApiError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-provided error body, when there is a meaningful one.
    ///
    /// Falsy bodies (`null`, `false`, zero, empty string) count as absent.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::Response {
                body: Some(body), ..
            } if !is_blank(body) => Some(body),
            _ => None,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Response { status, body, .. } => match body {
                Some(body) => write!(f, "server responded with status {status}: {body}"),
                None => write!(f, "server responded with status {status}"),
            },
            Self::NoResponse { request, message } => {
                write!(f, "no response for {request}: {message}")
            }
            Self::Request { message } => write!(f, "request failed: {message}"),
            Self::Decode { message } => write!(f, "decode response: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Normalized error stored by session-note operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Body(Value),
    Message(String),
}

impl ErrorPayload {
    pub fn from_api_error(err: &ApiError, fallback: &str) -> Self {
        match err.response_body() {
            Some(body) => Self::Body(body.clone()),
            None => Self::Message(fallback.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body(body) => write!(f, "{body}"),
            Self::Message(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ErrorPayload {}
