///
/// Parameter dictionary access.
///
/// The host hands every method an opaque JSON object. These helpers read
/// it leniently, the way script callers expect: missing or null keys fall
/// back to a default, scalars are coerced to strings where a string is
/// wanted, and only a structurally wrong value (a non-array where an array
/// is required) is rejected.
///

use serde_json::Value;

use crate::error::BridgeError;

pub fn get_string(params: &Value, key: &str, default: &str) -> String {
    match params.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn get_array<'a>(params: &'a Value, key: &str) -> Result<Option<&'a [Value]>, BridgeError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(_) => Err(BridgeError::InvalidParams(format!(
            "'{}' must be an array",
            key
        ))),
    }
}

pub fn get_bool(params: &Value, key: &str, default: bool) -> bool {
    match params.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}

/// Reads an array of strings, stringifying non-string elements.
pub fn get_string_list(params: &Value, key: &str) -> Result<Vec<String>, BridgeError> {
    let Some(items) = get_array(params, key)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}
