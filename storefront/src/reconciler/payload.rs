// storefront/src/reconciler/payload.rs

//! Field extraction for webhook payloads.

use serde_json::{Map, Value};

use crate::errors::ValidationError;

pub type Fields = Map<String, Value>;

pub fn as_object(payload: &Value) -> Result<&Fields, ValidationError> {
  payload.as_object().ok_or(ValidationError::InvalidPayload)
}

/// Fails on the first key in `keys` that is absent.
pub fn require_keys(fields: &Fields, keys: &[&str]) -> Result<(), ValidationError> {
  match keys.iter().find(|k| !fields.contains_key(**k)) {
    Some(missing) => Err(ValidationError::MissingKey((*missing).to_string())),
    None => Ok(()),
  }
}

fn get<'a>(fields: &'a Fields, key: &str) -> Result<&'a Value, ValidationError> {
  fields.get(key).ok_or_else(|| ValidationError::MissingKey(key.to_string()))
}

fn invalid(key: &str) -> ValidationError {
  ValidationError::InvalidKey(key.to_string())
}

pub fn string(fields: &Fields, key: &str) -> Result<String, ValidationError> {
  match get(fields, key)? {
    Value::String(s) => Ok(s.clone()),
    _ => Err(invalid(key)),
  }
}

/// External identifiers arrive as strings, occasionally as integers.
pub fn identifier(fields: &Fields, key: &str) -> Result<String, ValidationError> {
  match get(fields, key)? {
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
    _ => Err(invalid(key)),
  }
}

/// Present, but may be `null`.
pub fn nullable_string(fields: &Fields, key: &str) -> Result<Option<String>, ValidationError> {
  match get(fields, key)? {
    Value::String(s) => Ok(Some(s.clone())),
    Value::Null => Ok(None),
    _ => Err(invalid(key)),
  }
}

/// May be absent or `null`.
pub fn optional_string(fields: &Fields, key: &str) -> Result<Option<String>, ValidationError> {
  match fields.get(key) {
    None => Ok(None),
    Some(_) => nullable_string(fields, key),
  }
}

pub fn string_list(fields: &Fields, key: &str) -> Result<Vec<String>, ValidationError> {
  let items = get(fields, key)?.as_array().ok_or_else(|| invalid(key))?;
  items
    .iter()
    .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(key)))
    .collect()
}
