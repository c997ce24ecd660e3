use std::time::Duration;

use anyhow::Context;
use reqwest::{
    Url,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    ApiError, BoxFuture, CounselorApi, SessionNoteApi,
    request::{Encoding, NotePayload, RequestConfig, form_text},
};
use crate::{
    domain::{Counselor, SessionNote},
    version::VERSION,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CREATE_SEGMENT: &str = "create";
const CREATE_SESSION_SEGMENT: &str = "createSession";
const LIST_SESSION_NOTES_SEGMENT: &str = "getSessionNotes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `reqwest` implementation of both resource APIs against one base URL.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: Url,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        let base = Url::parse(trimmed)
            .with_context(|| format!("invalid api base url: {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("api base url cannot carry paths: {trimmed}");
        }
        let client = reqwest::Client::builder()
            .user_agent(format!("counseling/{VERSION}"))
            .timeout(config.timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, segment: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        if let Some(segment) = segment {
            // `Url` drops dot segments on push, which would address the collection itself.
            if matches!(segment, "." | "..") {
                return Err(ApiError::request(format!("invalid path segment: {segment}")));
            }
            url.path_segments_mut()
                .map_err(|()| {
                    ApiError::request(format!("base url cannot carry paths: {}", self.base))
                })?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = builder
            .build()
            .map_err(|e| ApiError::request(e.to_string()))?;
        let described = format!("{} {}", request.method(), request.url());
        debug!(request = %described, "sending api request");

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_builder() {
                ApiError::request(e.to_string())
            } else {
                ApiError::NoResponse {
                    request: described.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }

    fn note_request(
        &self,
        url: Url,
        payload: NotePayload,
        config: &RequestConfig,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let mut builder = self.client.post(url);
        for (name, value) in &config.headers {
            // The multipart body sets its own content type with the boundary.
            if config.encoding == Encoding::Multipart && name.eq_ignore_ascii_case("content-type")
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        match config.encoding {
            Encoding::Json => {
                if !payload.files.is_empty() {
                    return Err(ApiError::request("file parts require multipart encoding"));
                }
                Ok(builder.json(&payload.fields))
            }
            Encoding::Multipart => {
                let mut form = Form::new();
                for (key, value) in &payload.fields {
                    form = form.text(key.clone(), form_text(value));
                }
                for file in payload.files {
                    let mut part = Part::bytes(file.bytes).file_name(file.file_name);
                    if let Some(content_type) = &file.content_type {
                        part = part
                            .mime_str(content_type)
                            .map_err(|e| ApiError::request(e.to_string()))?;
                    }
                    form = form.part(file.field, part);
                }
                Ok(builder.multipart(form))
            }
        }
    }
}

async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = match response.bytes().await {
        Ok(bytes) => parse_error_body(&bytes),
        Err(err) => {
            warn!(%err, status, "read error response body");
            None
        }
    };
    ApiError::Response {
        status,
        headers,
        body,
    }
}

/// JSON when the body parses, raw text otherwise, `None` when empty.
fn parse_error_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

impl CounselorApi for HttpApi {
    fn list_counselors(&self) -> BoxFuture<'_, Result<Vec<Counselor>, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(None)?;
            self.send_json(self.client.get(url)).await
        })
    }

    fn get_counselor(&self, id: String) -> BoxFuture<'_, Result<Counselor, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(&id))?;
            self.send_json(self.client.get(url)).await
        })
    }

    fn create_counselor(
        &self,
        data: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Counselor, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(CREATE_SEGMENT))?;
            self.send_json(self.client.post(url).json(&data)).await
        })
    }

    fn update_counselor(
        &self,
        id: String,
        data: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Counselor, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(&id))?;
            self.send_json(self.client.put(url).json(&data)).await
        })
    }

    fn delete_counselor(&self, id: String) -> BoxFuture<'_, Result<(), ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(&id))?;
            self.send(self.client.delete(url)).await.map(|_| ())
        })
    }
}

impl SessionNoteApi for HttpApi {
    fn create_session_note(
        &self,
        payload: NotePayload,
        config: RequestConfig,
    ) -> BoxFuture<'_, Result<SessionNote, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(CREATE_SESSION_SEGMENT))?;
            let builder = self.note_request(url, payload, &config)?;
            self.send_json(builder).await
        })
    }

    fn list_session_notes(&self) -> BoxFuture<'_, Result<Vec<SessionNote>, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint(Some(LIST_SESSION_NOTES_SEGMENT))?;
            self.send_json(self.client.get(url)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::api::FilePart;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(ApiConfig::new(base)).unwrap()
    }

    #[test]
    fn endpoint_joins_segments_and_trims_trailing_slash() {
        let api = api("http://127.0.0.1:9000/api/counselors/");
        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "http://127.0.0.1:9000/api/counselors"
        );
        assert_eq!(
            api.endpoint(Some("create")).unwrap().as_str(),
            "http://127.0.0.1:9000/api/counselors/create"
        );
    }

    #[test]
    fn endpoint_encodes_id_as_one_segment() {
        let api = api("http://127.0.0.1:9000");
        assert_eq!(
            api.endpoint(Some("a/b c")).unwrap().as_str(),
            "http://127.0.0.1:9000/a%2Fb%20c"
        );
        assert_eq!(
            api.endpoint(Some("..a")).unwrap().as_str(),
            "http://127.0.0.1:9000/..a"
        );
        for dot in [".", ".."] {
            assert_eq!(
                api.endpoint(Some(dot)).unwrap_err(),
                ApiError::request(format!("invalid path segment: {dot}"))
            );
        }
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        assert!(HttpApi::new(ApiConfig::new("not a url")).is_err());
        assert!(HttpApi::new(ApiConfig::new("mailto:someone@example.com")).is_err());
    }

    #[test]
    fn error_body_parsing() {
        assert_eq!(parse_error_body(b""), None);
        assert_eq!(parse_error_body(b"  \n"), None);
        assert_eq!(
            parse_error_body(br#"{"msg":"bad"}"#),
            Some(json!({ "msg": "bad" }))
        );
        assert_eq!(
            parse_error_body(b"Internal Server Error"),
            Some(json!("Internal Server Error"))
        );
    }

    #[test]
    fn json_encoding_refuses_file_parts() {
        let api = api("http://127.0.0.1:9000");
        let payload = NotePayload::new().file(FilePart::new("f", "a.txt", b"x".to_vec()));
        let err = api
            .note_request(
                api.endpoint(Some(CREATE_SESSION_SEGMENT)).unwrap(),
                payload,
                &RequestConfig::default(),
            )
            .unwrap_err();
        assert_eq!(err, ApiError::request("file parts require multipart encoding"));
    }

    #[test]
    fn multipart_keeps_generated_content_type() {
        let api = api("http://127.0.0.1:9000");
        let config = RequestConfig::multipart()
            .with_header("Content-Type", "multipart/form-data")
            .with_header("X-Trace", "abc");
        let request = api
            .note_request(
                api.endpoint(Some(CREATE_SESSION_SEGMENT)).unwrap(),
                NotePayload::new().field("summary", "ok"),
                &config,
            )
            .unwrap()
            .build()
            .unwrap();

        let content_type = request.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(request.headers()["x-trace"], "abc");
    }
}
