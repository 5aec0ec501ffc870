//! Features, aggregation modes and windowed point queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Default number of points returned per key by a windowed read
pub const DEFAULT_LIMIT: u32 = 100;

/// Telemetry sub-protocol selected by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Timeseries,
    Attributes,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Timeseries => "timeseries",
            Feature::Attributes => "attributes",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("timeseries") {
            Ok(Feature::Timeseries)
        } else if s.eq_ignore_ascii_case("attributes") {
            Ok(Feature::Attributes)
        } else {
            Err(Error::malformed(format!("Unknown telemetry feature: {}", s)))
        }
    }
}

/// Bucketing function applied to a window, or `None` for raw points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    #[default]
    None,
    Avg,
    Min,
    Max,
    Sum,
    Count,
}

impl Aggregation {
    pub const ALL: [Aggregation; 6] = [
        Aggregation::None,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Sum,
        Aggregation::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::None => "NONE",
            Aggregation::Avg => "AVG",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Sum => "SUM",
            Aggregation::Count => "COUNT",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Aggregation::ALL
            .into_iter()
            .find(|agg| agg.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("Unsupported aggregation: {}", s)))
    }
}

/// Windowed historical read for a single key
///
/// `start_ts` is inclusive and `end_ts` exclusive, both epoch millis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointQuery {
    pub key: String,
    pub start_ts: i64,
    pub end_ts: i64,
    pub interval: i64,
    pub limit: u32,
    pub aggregation: Aggregation,
}

impl PointQuery {
    pub fn new(
        key: impl Into<String>,
        start_ts: i64,
        end_ts: i64,
        interval: i64,
        limit: u32,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            key: key.into(),
            start_ts,
            end_ts,
            interval,
            limit,
            aggregation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_is_case_insensitive() {
        assert_eq!("TIMESERIES".parse::<Feature>().unwrap(), Feature::Timeseries);
        assert_eq!("Attributes".parse::<Feature>().unwrap(), Feature::Attributes);
        assert!(matches!(
            "metrics".parse::<Feature>(),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_aggregation_parse() {
        assert_eq!("AVG".parse::<Aggregation>().unwrap(), Aggregation::Avg);
        assert_eq!("count".parse::<Aggregation>().unwrap(), Aggregation::Count);
        assert!(matches!(
            "MEDIAN".parse::<Aggregation>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_aggregation_default_is_none() {
        assert_eq!(Aggregation::default(), Aggregation::None);
    }
}
