//! Contract between the generation client and the content generators.
//!
//! A schema turns an untrusted JSON payload into a canonical value or a
//! [`SchemaViolation`] describing the first problem found. Violations feed the
//! correction prompt, so they are written as instructions the model can act on.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::util::strip_code_fences;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SchemaViolation(pub String);

impl SchemaViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait ResponseSchema: Send + Sync {
    type Output: Send;

    /// Short name used in logs and errors ("roadmap", "quiz", ...).
    fn name(&self) -> &'static str;

    /// System prompt sent with every request for this schema.
    fn system_prompt(&self) -> Option<&'static str> {
        None
    }

    fn validate(&self, value: Value) -> Result<Self::Output, SchemaViolation>;
}

/// Parse raw model text and validate it against `schema`.
pub fn parse_payload<S>(schema: &S, raw: &str) -> Result<S::Output, SchemaViolation>
where
    S: ResponseSchema + ?Sized,
{
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(SchemaViolation::new("response was empty; expected a JSON object"));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SchemaViolation::new(format!("response is not valid JSON: {}", e)))?;
    schema.validate(value)
}

/// Accept either `{"<key>": [...]}` or a bare array.
pub fn take_list(value: Value, key: &str) -> Result<Value, SchemaViolation> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            SchemaViolation::new(format!("expected a top-level \"{}\" array", key))
        }),
        other => Err(SchemaViolation::new(format!(
            "expected a JSON object with a \"{}\" array, got {}",
            key,
            json_kind(&other)
        ))),
    }
}

/// Deserialize into a wire struct, turning serde errors into violations.
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, SchemaViolation> {
    serde_json::from_value(value)
        .map_err(|e| SchemaViolation::new(format!("{} has the wrong shape: {}", what, e)))
}

pub fn require_text(value: &str, what: &str) -> Result<String, SchemaViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchemaViolation::new(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
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
