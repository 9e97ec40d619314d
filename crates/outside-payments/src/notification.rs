//! Decoding of provider notifications.
//!
//! PayU posts confirmations as `application/x-www-form-urlencoded`, MercadoPago
//! as JSON, and both are accepted on either endpoint. Fields are kept as a flat
//! map; each provider picks out what it needs.

use serde_json::{Map, Value};

use crate::error::RelayError;
use crate::request::number_text;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A decoded notification body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    fields: Map<String, Value>,
}

impl Notification {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Decode a JSON object body. An empty body decodes to no fields.
    pub fn from_json(body: &[u8]) -> Result<Self, RelayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(RelayError::MalformedNotification(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(RelayError::MalformedNotification(e.to_string())),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Self {
        let fields = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Self { fields }
    }

    /// Decode by content type, defaulting to JSON.
    pub fn decode(content_type: Option<&str>, body: &[u8]) -> Result<Self, RelayError> {
        let is_form = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false);
        if is_form {
            Ok(Self::from_form(body))
        } else {
            Self::from_json(body)
        }
    }

    /// Fill fields absent from the body with query-string parameters.
    pub fn with_query(mut self, query: &str) -> Self {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            self.fields
                .entry(k.into_owned())
                .or_insert_with(|| Value::String(v.into_owned()));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field as text. Strings are returned as-is and numbers in their JSON
    /// rendering. Absent, null, empty and non-scalar values yield `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(number_text(n)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
