//! Query building for time-series value reads

use crate::params::QueryParams;
use telegate_core::{Aggregation, Error, PointQuery, Result};

pub const INCOMPLETE_RANGE: &str = "incomplete time range";
pub const KEYS_REQUIRED: &str = "keys parameter is required for a time range query";

/// Time-series read parameters, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesParams {
    pub keys: Option<Vec<String>>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub interval: Option<i64>,
    pub limit: Option<u32>,
    pub agg: Option<String>,
}

impl SeriesParams {
    pub fn from_query(params: &QueryParams) -> Result<Self> {
        Ok(Self {
            keys: params.keys(),
            start_ts: params.get_i64("startTs")?,
            end_ts: params.get_i64("endTs")?,
            interval: params.get_i64("interval")?,
            limit: params.get_u32("limit")?,
            agg: params.get("agg").map(str::to_string),
        })
    }
}

/// Store call selected by a time-series read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesRead {
    /// Most recent sample per key; `None` means every key of the entity
    Latest { keys: Option<Vec<String>> },
    /// One windowed query per requested key
    Windowed(Vec<PointQuery>),
}

/// Resolve read parameters into a [`SeriesRead`].
///
/// The window fields `startTs`, `endTs` and `interval` are all-or-nothing.
/// `limit` on its own does not describe a window and is rejected the same
/// way. An interval of exactly zero disables aggregation even when `agg` was
/// given.
pub fn build_queries(params: SeriesParams, default_limit: u32) -> Result<SeriesRead> {
    let SeriesParams {
        keys,
        start_ts,
        end_ts,
        interval,
        limit,
        agg,
    } = params;

    let (start_ts, end_ts, interval) = match (start_ts, end_ts, interval, limit) {
        (None, None, None, None) => return Ok(SeriesRead::Latest { keys }),
        (Some(start), Some(end), Some(interval), _) if interval >= 0 => (start, end, interval),
        _ => return Err(Error::validation(INCOMPLETE_RANGE)),
    };

    let aggregation = if interval == 0 {
        Aggregation::None
    } else {
        agg.as_deref()
            .map(str::parse::<Aggregation>)
            .transpose()?
            .unwrap_or_default()
    };

    let keys = keys.ok_or_else(|| Error::validation(KEYS_REQUIRED))?;
    let limit = limit.unwrap_or(default_limit);

    Ok(SeriesRead::Windowed(
        keys.into_iter()
            .map(|key| PointQuery::new(key, start_ts, end_ts, interval, limit, aggregation))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use telegate_core::DEFAULT_LIMIT;

    fn window(start: Option<i64>, end: Option<i64>, interval: Option<i64>) -> SeriesParams {
        SeriesParams {
            keys: Some(vec!["temp".into(), "hum".into()]),
            start_ts: start,
            end_ts: end,
            interval,
            ..Default::default()
        }
    }

    fn expect_incomplete(result: Result<SeriesRead>) {
        match result {
            Err(Error::Validation(msg)) => assert_eq!(msg, INCOMPLETE_RANGE),
            other => panic!("expected incomplete range, got {other:?}"),
        }
    }

    #[test]
    fn test_latest_when_no_window_params() {
        let read = build_queries(window(None, None, None), DEFAULT_LIMIT).unwrap();
        assert_eq!(
            read,
            SeriesRead::Latest {
                keys: Some(vec!["temp".into(), "hum".into()])
            }
        );

        let all = build_queries(SeriesParams::default(), DEFAULT_LIMIT).unwrap();
        assert_eq!(all, SeriesRead::Latest { keys: None });
    }

    #[test]
    fn test_partial_window_is_rejected() {
        let partial = [
            (Some(1), None, None),
            (None, Some(2), None),
            (None, None, Some(3)),
            (Some(1), Some(2), None),
            (Some(1), None, Some(3)),
            (None, Some(2), Some(3)),
        ];
        for (start, end, interval) in partial {
            expect_incomplete(build_queries(window(start, end, interval), DEFAULT_LIMIT));
        }
    }

    #[test]
    fn test_limit_alone_is_rejected() {
        let params = SeriesParams {
            limit: Some(10),
            ..window(None, None, None)
        };
        expect_incomplete(build_queries(params, DEFAULT_LIMIT));
    }

    #[test]
    fn test_negative_interval_is_rejected() {
        expect_incomplete(build_queries(window(Some(0), Some(10), Some(-1)), DEFAULT_LIMIT));
    }

    #[test]
    fn test_one_query_per_key_with_shared_window() {
        let params = SeriesParams {
            agg: Some("avg".into()),
            limit: Some(7),
            ..window(Some(1000), Some(2000), Some(100))
        };
        let SeriesRead::Windowed(queries) = build_queries(params, DEFAULT_LIMIT).unwrap() else {
            panic!("expected windowed read");
        };

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].key, "temp");
        assert_eq!(queries[1].key, "hum");
        for q in &queries {
            assert_eq!((q.start_ts, q.end_ts, q.interval, q.limit), (1000, 2000, 100, 7));
            assert_eq!(q.aggregation, Aggregation::Avg);
        }
    }

    #[test]
    fn test_zero_interval_forces_no_aggregation() {
        for agg in ["AVG", "max", "COUNT", "bogus"] {
            let params = SeriesParams {
                agg: Some(agg.into()),
                ..window(Some(0), Some(10), Some(0))
            };
            let SeriesRead::Windowed(queries) = build_queries(params, DEFAULT_LIMIT).unwrap() else {
                panic!("expected windowed read");
            };
            assert!(queries.iter().all(|q| q.aggregation == Aggregation::None));
        }
    }

    #[test]
    fn test_default_limit_and_aggregation() {
        let SeriesRead::Windowed(queries) =
            build_queries(window(Some(0), Some(10), Some(5)), 42).unwrap()
        else {
            panic!("expected windowed read");
        };
        assert_eq!(queries[0].limit, 42);
        assert_eq!(queries[0].aggregation, Aggregation::None);
    }

    #[test]
    fn test_unknown_aggregation_is_validation_error() {
        let params = SeriesParams {
            agg: Some("MEDIAN".into()),
            ..window(Some(0), Some(10), Some(5))
        };
        let err = build_queries(params, DEFAULT_LIMIT).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_window_without_keys() {
        let params = SeriesParams {
            keys: None,
            ..window(Some(0), Some(10), Some(5))
        };
        match build_queries(params, DEFAULT_LIMIT) {
            Err(Error::Validation(msg)) => assert_eq!(msg, KEYS_REQUIRED),
            other => panic!("unexpected {other:?}"),
        }
    }
}
