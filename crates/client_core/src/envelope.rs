//! Response envelope handling: bodies arrive either as `{ "data": T }` or as a
//! bare `T`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientResult;

fn data_field(body: &Value) -> Option<&Value> {
    body.as_object()
        .and_then(|map| map.get("data"))
        .filter(|data| !data.is_null())
}

/// Unwraps a single payload, trying `data` first and the body itself second.
pub fn unwrap_one<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    if let Some(data) = data_field(&body) {
        if let Ok(value) = T::deserialize(data) {
            return Ok(value);
        }
    }
    Ok(serde_json::from_value(body)?)
}

/// Unwraps a list payload; anything that is neither `{data: [..]}` nor `[..]`
/// yields an empty list.
pub fn unwrap_list<T: DeserializeOwned>(body: Value) -> ClientResult<Vec<T>> {
    let list = match data_field(&body) {
        Some(data @ Value::Array(_)) => data.clone(),
        _ => match body {
            array @ Value::Array(_) => array,
            _ => return Ok(Vec::new()),
        },
    };
    Ok(serde_json::from_value(list)?)
}

#[cfg(test)]
#[path = "tests/envelope_tests.rs"]
mod tests;
