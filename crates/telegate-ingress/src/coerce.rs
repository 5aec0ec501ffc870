//! Coercion of loosely typed JSON into typed telemetry values

use serde_json::{Map, Number, Value};
use telegate_core::{AttributeKvEntry, Error, KvEntry, KvValue, Result};

pub const INVALID_ATTRIBUTES_JSON: &str = "Unable to parse attributes payload: Invalid JSON body!";
pub const NO_ATTRIBUTES: &str = "No attributes data found in request body!";

/// Parse an attribute write body into records sharing one capture timestamp.
///
/// Only a top-level JSON object yields records. Fields holding an object, an
/// array or null are skipped without error.
pub fn parse_attributes_payload(body: &[u8]) -> Result<Vec<AttributeKvEntry>> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|_| Error::InvalidPayload(INVALID_ATTRIBUTES_JSON.to_string()))?;
    let captured_at = chrono::Utc::now().timestamp_millis();

    let attributes = match &json {
        Value::Object(map) => coerce_attributes(map, captured_at)?,
        _ => Vec::new(),
    };
    if attributes.is_empty() {
        return Err(Error::validation(NO_ATTRIBUTES));
    }
    Ok(attributes)
}

pub fn coerce_attributes(map: &Map<String, Value>, captured_at: i64) -> Result<Vec<AttributeKvEntry>> {
    let mut attributes = Vec::with_capacity(map.len());
    for (key, value) in map {
        if let Some(value) = coerce_primitive(key, value)? {
            attributes.push(AttributeKvEntry::new(KvEntry::new(key.as_str(), value), captured_at));
        }
    }
    Ok(attributes)
}

/// Typed value of a scalar JSON field, `None` for null, objects and arrays.
pub fn coerce_primitive(key: &str, value: &Value) -> Result<Option<KvValue>> {
    Ok(match value {
        Value::String(s) => Some(KvValue::String(s.clone())),
        Value::Bool(b) => Some(KvValue::Boolean(*b)),
        Value::Number(n) => Some(coerce_number(key, n)?),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    })
}

/// A literal written with a fraction or exponent is a double. Any other
/// literal must fit in a signed 64-bit integer.
pub fn coerce_number(key: &str, number: &Number) -> Result<KvValue> {
    if number.is_f64() {
        if let Some(d) = number.as_f64() {
            return Ok(KvValue::Double(d));
        }
    }
    number
        .as_i64()
        .map(KvValue::Long)
        .ok_or_else(|| Error::validation(format!("unsupported numeric range for key '{key}': {number}")))
}
