//! Typed access to request query parameters

use std::collections::HashMap;
use std::str::FromStr;

use telegate_core::{Error, Result};

/// Query string parameters of a telemetry request.
///
/// An empty value is treated the same as an absent parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>> {
        self.parse(name)
    }

    pub fn get_u32(&self, name: &str) -> Result<Option<u32>> {
        self.parse(name)
    }

    /// Comma-separated `keys` parameter, or `None` when absent.
    pub fn keys(&self) -> Option<Vec<String>> {
        self.get("keys").map(split_keys).filter(|keys| !keys.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.get(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|_| {
                    Error::validation(format!("Invalid value of parameter '{name}': {raw}"))
                })
            })
            .transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_absent() {
        let params: QueryParams = [("startTs", "")].into_iter().collect();
        assert_eq!(params.get_i64("startTs").unwrap(), None);
    }

    #[test]
    fn test_numeric_parsing() {
        let params: QueryParams = [("startTs", "1000"), ("limit", "5")].into_iter().collect();
        assert_eq!(params.get_i64("startTs").unwrap(), Some(1000));
        assert_eq!(params.get_u32("limit").unwrap(), Some(5));
    }

    #[test]
    fn test_bad_number_is_validation_error() {
        let params: QueryParams = [("interval", "soon")].into_iter().collect();
        let err = params.get_i64("interval").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_keys_preserve_order() {
        let params: QueryParams = [("keys", "temp, hum,,pressure")].into_iter().collect();
        assert_eq!(params.keys().unwrap(), vec!["temp", "hum", "pressure"]);
        assert_eq!(QueryParams::default().keys(), None);
    }
}
