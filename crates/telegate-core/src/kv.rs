//! Typed key/value entries for attributes and time-series points

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of value types a telemetry entry can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KvValue {
    String(String),
    Boolean(bool),
    Long(i64),
    Double(f64),
}

impl KvValue {
    /// Numeric view used by aggregations; strings and booleans have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KvValue::Long(v) => Some(*v as f64),
            KvValue::Double(v) => Some(*v),
            KvValue::String(_) | KvValue::Boolean(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            KvValue::String(_) => "STRING",
            KvValue::Boolean(_) => "BOOLEAN",
            KvValue::Long(_) => "LONG",
            KvValue::Double(_) => "DOUBLE",
        }
    }
}

/// Canonical string form: integers without a decimal point, doubles always in
/// decimal form, booleans as `true`/`false`, strings verbatim.
impl fmt::Display for KvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvValue::String(v) => f.write_str(v),
            KvValue::Boolean(v) => write!(f, "{}", v),
            KvValue::Long(v) => write!(f, "{}", v),
            KvValue::Double(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
        }
    }
}

impl From<&str> for KvValue {
    fn from(v: &str) -> Self {
        KvValue::String(v.to_string())
    }
}

impl From<String> for KvValue {
    fn from(v: String) -> Self {
        KvValue::String(v)
    }
}

impl From<bool> for KvValue {
    fn from(v: bool) -> Self {
        KvValue::Boolean(v)
    }
}

impl From<i64> for KvValue {
    fn from(v: i64) -> Self {
        KvValue::Long(v)
    }
}

impl From<f64> for KvValue {
    fn from(v: f64) -> Self {
        KvValue::Double(v)
    }
}

/// A single named value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: KvValue,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<KvValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Time-series point: a value captured at `ts` (epoch millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsKvEntry {
    pub ts: i64,
    #[serde(flatten)]
    pub entry: KvEntry,
}

impl TsKvEntry {
    pub fn new(ts: i64, entry: KvEntry) -> Self {
        Self { ts, entry }
    }

    pub fn key(&self) -> &str {
        &self.entry.key
    }

    pub fn value(&self) -> &KvValue {
        &self.entry.value
    }

    /// Value rendered in its canonical string form
    pub fn value_as_string(&self) -> String {
        self.entry.value.to_string()
    }
}

/// Attribute record with the time of its last update (epoch millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeKvEntry {
    #[serde(flatten)]
    pub entry: KvEntry,
    pub last_update_ts: i64,
}

impl AttributeKvEntry {
    pub fn new(entry: KvEntry, last_update_ts: i64) -> Self {
        Self {
            entry,
            last_update_ts,
        }
    }

    pub fn key(&self) -> &str {
        &self.entry.key
    }

    pub fn value(&self) -> &KvValue {
        &self.entry.value
    }
}
