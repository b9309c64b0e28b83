// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire codec between value objects and the JSON the web runtime exchanges.
//
// Every decode failure is reported as `LivemapError::Decode` carrying the
// target type and serde's description (which names the offending field).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LivemapError, Result};

/// Encode a value object into its structured wire form.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LivemapError::Encode(e.to_string()))
}

/// Encode a value object into compact JSON text.
pub fn encode_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| LivemapError::Encode(e.to_string()))
}

/// Decode a structured payload into `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| LivemapError::decode(type_label::<T>(), e))
}

/// Decode JSON text into `T`.
pub fn decode_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| LivemapError::decode(type_label::<T>(), e))
}

/// Decode the required `key` of an object payload.
///
/// A missing key, a non-object payload, or an explicit `null` are all
/// reported as a missing field.
pub fn field<T: DeserializeOwned>(payload: &Value, key: &'static str) -> Result<T> {
    match payload.get(key) {
        Some(Value::Null) | None => Err(LivemapError::decode(
            type_label::<T>(),
            format!("missing field `{key}`"),
        )),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| LivemapError::decode(type_label::<T>(), format!("field `{key}`: {e}"))),
    }
}

/// Decode an optional `key` of an object payload. Absent and `null` are `None`.
pub fn optional_field<T: DeserializeOwned>(payload: &Value, key: &'static str) -> Result<Option<T>> {
    match payload.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(_) => field(payload, key).map(Some),
    }
}

/// Last path segment of `T`'s type name (`livemap_core::geo::Coordinates` -> `Coordinates`).
fn type_label<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.find('<') {
        Some(_) => full,
        None => full.rsplit("::").next().unwrap_or(full),
    }
}
