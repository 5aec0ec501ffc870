//! Time-series upload payload parsing
//!
//! Accepted body shapes:
//! - `{"temp": 21.5, "hum": 40}`, stamped with the time of ingestion
//! - `{"ts": 1700000000000, "values": {"temp": 21.5}}`
//! - a JSON array of either shape

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use telegate_core::{Error, KvEntry, KvValue, Result, TsKvEntry};

use crate::coerce::coerce_number;

pub const INVALID_SERIES_JSON: &str = "Unable to parse timeseries payload: Invalid JSON body!";
pub const NO_SERIES: &str = "No timeseries data found in request body!";

/// Parse a series write body into points ordered by timestamp.
///
/// Entries that share a timestamp keep their payload order.
pub fn parse_series_payload(body: &[u8]) -> Result<Vec<TsKvEntry>> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|_| Error::InvalidPayload(INVALID_SERIES_JSON.to_string()))?;
    let now = chrono::Utc::now().timestamp_millis();

    let points: Vec<TsKvEntry> = convert_to_telemetry(&json, now)?
        .into_iter()
        .flat_map(|(ts, entries)| entries.into_iter().map(move |entry| TsKvEntry::new(ts, entry)))
        .collect();

    if points.is_empty() {
        return Err(Error::validation(NO_SERIES));
    }
    Ok(points)
}

/// Group the entries of an upload payload by timestamp.
pub fn convert_to_telemetry(json: &Value, now: i64) -> Result<BTreeMap<i64, Vec<KvEntry>>> {
    let mut batch = BTreeMap::new();
    match json {
        Value::Object(object) => parse_object(&mut batch, object, now)?,
        Value::Array(items) => {
            for item in items {
                let Value::Object(object) = item else {
                    return Err(cant_parse(item));
                };
                parse_object(&mut batch, object, now)?;
            }
        }
        other => return Err(cant_parse(other)),
    }
    Ok(batch)
}

fn parse_object(
    batch: &mut BTreeMap<i64, Vec<KvEntry>>,
    object: &Map<String, Value>,
    now: i64,
) -> Result<()> {
    let (ts, values) = match (object.get("ts"), object.get("values")) {
        (Some(ts), Some(values)) => {
            let ts = ts.as_i64().ok_or_else(|| cant_parse(ts))?;
            let Value::Object(values) = values else {
                return Err(cant_parse(values));
            };
            (ts, values)
        }
        _ => (now, object),
    };

    let entries = batch.entry(ts).or_default();
    for (key, value) in values {
        let value: KvValue = match value {
            Value::String(s) => s.clone().into(),
            Value::Bool(b) => (*b).into(),
            Value::Number(n) => coerce_number(key, n)?,
            other => return Err(cant_parse(other)),
        };
        entries.push(KvEntry::new(key.as_str(), value));
    }
    Ok(())
}

fn cant_parse(value: &Value) -> Error {
    Error::validation(format!("Can't parse value: {value}"))
}
