use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    EmptyRecordId,
    InvalidRecordData { reason: String },
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyRecordId | Self::InvalidRecordData { .. } => "invalid_args",
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRecordId => write!(f, "record id is empty"),
            Self::InvalidRecordData { reason } => write!(f, "invalid record data: {reason}"),
        }
    }
}

impl std::error::Error for DomainError {}

pub fn validate_record_id(id: &str) -> Result<String, DomainError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(DomainError::EmptyRecordId);
    }
    Ok(id.to_string())
}

/// Parses caller-supplied record fields. Only JSON objects are accepted.
pub fn parse_record_data(raw: &str) -> Result<Map<String, Value>, DomainError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DomainError::InvalidRecordData {
            reason: e.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DomainError::InvalidRecordData {
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A server-owned record: the `_id` key plus whatever fields the API returns.
///
/// Unknown fields are kept verbatim so a record read from the API can be
/// written back without loss. A record without `_id` never matches an id
/// lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id() == Some(id)
    }
}

pub type Counselor = Record;
pub type SessionNote = Record;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn record_keeps_unknown_fields() {
        let raw = json!({ "_id": "a", "name": "Dana", "specialties": ["grief"] });
        let record: Record = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(record.id(), Some("a"));
        assert_eq!(record.fields.get("name"), Some(&json!("Dana")));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn record_without_id_matches_nothing() {
        let record: Record = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert_eq!(record.id(), None);
        assert!(!record.has_id(""));
    }

    #[test]
    fn parse_record_data_rejects_non_objects() {
        let err = parse_record_data("[1,2]").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidRecordData {
                reason: "expected a JSON object, got array".to_string()
            }
        );
        assert!(parse_record_data("{not json").is_err());
        assert_eq!(
            parse_record_data(r#"{"name":"Dana"}"#).unwrap().get("name"),
            Some(&json!("Dana"))
        );
    }

    #[test]
    fn record_id_is_trimmed_and_required() {
        assert_eq!(validate_record_id("  abc ").unwrap(), "abc");
        assert_eq!(validate_record_id("   "), Err(DomainError::EmptyRecordId));
    }
}
