use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, SapError};

fn serde_error(code: &str, err: impl ToString) -> SapError {
    SapError::Serde(ErrorInfo::new(format!("sap_core.{code}"), err.to_string()))
}

/// Rebuilds every object with lexically sorted keys, at any depth.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn canonical_value<T: Serialize>(value: &T) -> Result<Value, SapError> {
    serde_json::to_value(value)
        .map(sort_keys)
        .map_err(|err| serde_error("json_serialize", err))
}

/// Compact JSON with sorted keys; the input to every content hash.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SapError> {
    serde_json::to_vec(&canonical_value(value)?).map_err(|err| serde_error("json_write", err))
}

/// Sorted-key JSON indented by two spaces, newline terminated.
pub fn to_canonical_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>, SapError> {
    let mut bytes = serde_json::to_vec_pretty(&canonical_value(value)?)
        .map_err(|err| serde_error("json_write", err))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses JSON bytes into `T`.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SapError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
}

/// YAML rendering of `value`.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, SapError> {
    serde_yaml::to_string(value).map_err(|err| serde_error("yaml_serialize", err))
}

/// Parses YAML bytes into `T`.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SapError> {
    serde_yaml::from_slice(data).map_err(|err| serde_error("yaml_deserialize", err))
}
