//! Reshaping of store results into response payloads

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use telegate_core::{AttributeKvEntry, KvValue, TsKvEntry};

/// One rendered time-series sample
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TsData {
    pub ts: i64,
    pub value: String,
}

/// Points grouped by key.
///
/// Keys appear in the order they were first seen in the store result and
/// points keep the store's order within each key. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesData {
    groups: Vec<(String, Vec<TsData>)>,
    // key -> position in `groups`
    index: HashMap<String, usize>,
}

impl SeriesData {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&[TsData]> {
        self.index
            .get(key)
            .map(|&position| self.groups[position].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, key: &str, point: TsData) {
        match self.index.get(key) {
            Some(&position) => self.groups[position].1.push(point),
            None => {
                self.index.insert(key.to_string(), self.groups.len());
                self.groups.push((key.to_string(), vec![point]));
            }
        }
    }
}

impl Serialize for SeriesData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (key, points) in &self.groups {
            map.serialize_entry(key, points)?;
        }
        map.end()
    }
}

/// One attribute in a values response
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeData {
    pub last_update_ts: i64,
    pub key: String,
    pub value: KvValue,
}

pub fn group_series(points: Vec<TsKvEntry>) -> SeriesData {
    let mut data = SeriesData::default();
    for point in points {
        let value = point.value_as_string();
        data.push(point.key(), TsData { ts: point.ts, value });
    }
    data
}

pub fn attribute_values(attributes: Vec<AttributeKvEntry>) -> Vec<AttributeData> {
    attributes
        .into_iter()
        .map(|attribute| AttributeData {
            last_update_ts: attribute.last_update_ts,
            key: attribute.entry.key,
            value: attribute.entry.value,
        })
        .collect()
}

/// Keys of a series result, duplicates included.
pub fn series_keys(points: &[TsKvEntry]) -> Vec<String> {
    points.iter().map(|p| p.key().to_string()).collect()
}

pub fn attribute_keys(attributes: &[AttributeKvEntry]) -> Vec<String> {
    attributes.iter().map(|a| a.key().to_string()).collect()
}
