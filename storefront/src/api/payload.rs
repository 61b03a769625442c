//! Response body classification and decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Marker upstream puts in the body (plain text or inside a JSON error) when rate limiting.
pub const RATE_LIMIT_MARKER: &str = "Too Many Requests";

/// Envelope keys that may sit next to `result` / `data`.
const ENVELOPE_META: &[&str] = &["success", "status", "message", "code", "error"];

/// Classifies a raw response.
///
/// The rate-limit marker counts in a non-2xx body, in a 2xx body that is not JSON, or in
/// a top-level `error` / `message` string; data that merely mentions it stays data.
/// An empty 2xx body reads as `null` (writes often answer with no content).
pub fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        if response.body.contains(RATE_LIMIT_MARKER) {
            return Err(ApiError::RateLimited);
        }
        return Err(ApiError::Status {
            status: response.status,
            body: truncate(&response.body, 200),
        });
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) if reports_rate_limit(&value) => Err(ApiError::RateLimited),
        Ok(value) => Ok(value),
        Err(_) if response.body.contains(RATE_LIMIT_MARKER) => Err(ApiError::RateLimited),
        Err(e) => Err(e.into()),
    }
}

fn reports_rate_limit(value: &Value) -> bool {
    ["error", "message"].iter().any(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|text| text.contains(RATE_LIMIT_MARKER))
    })
}

/// Strips a `{ "result": ... }` or `{ "data": ... }` envelope, if present.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            let key = ["result", "data"].into_iter().find(|k| map.contains_key(*k));
            let only_meta = map
                .keys()
                .all(|k| k == "result" || k == "data" || ENVELOPE_META.contains(&k.as_str()));
            match key {
                Some(key) if only_meta => map.remove(key).unwrap_or(Value::Null),
                _ => Value::Object(map),
            }
        }
        other => other,
    }
}

/// Decodes an (unwrapped) value into `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

/// Extracts a list: a bare array, or the array under `key` of an object.
pub fn as_list(value: Value, key: &str) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::Parse(format!("expected a list under `{}`", key))),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(ApiError::Parse("expected a list".into())),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
