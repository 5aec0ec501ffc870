//! In-memory telemetry store
//!
//! Series are kept per entity and key, sorted by timestamp. Attributes are
//! kept per entity and scope in first-write order, last write wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use telegate_core::{
    Aggregation, AttributeKvEntry, AttributeScope, EntityId, Error, KvEntry, KvValue, PointQuery,
    Result, TelemetryStore, TenantId, TsKvEntry,
};
use tokio::sync::RwLock;

use crate::config::StorageConfig;
use crate::error::StorageError;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Clone)]
struct StoredPoint {
    ts: i64,
    value: KvValue,
    /// Epoch millis after which the point is no longer visible
    expires_at: Option<i64>,
}

impl StoredPoint {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default)]
struct EntitySeries {
    /// Keys in first-write order
    keys: Vec<String>,
    points: HashMap<String, Vec<StoredPoint>>,
}

#[derive(Debug, Default)]
struct StoreState {
    series: HashMap<EntityId, EntitySeries>,
    attributes: HashMap<(EntityId, AttributeScope), Vec<AttributeKvEntry>>,
    owners: HashMap<EntityId, TenantId>,
}

/// [`TelemetryStore`] held entirely in process memory
pub struct MemoryTelemetryStore {
    state: RwLock<StoreState>,
    config: StorageConfig,
    clock: Clock,
    fail_next: Mutex<Option<String>>,
}

impl MemoryTelemetryStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            config,
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
            fail_next: Mutex::new(None),
        }
    }

    /// Replace the wall clock used for TTL expiry.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Simulate an outage: the next store call fails with
    /// [`StorageError::Unavailable`], surfaced as [`Error::Store`].
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(message.into());
        }
    }

    /// Number of stored points across every entity, expired ones included.
    pub async fn point_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .series
            .values()
            .flat_map(|series| series.points.values())
            .map(Vec::len)
            .sum()
    }

    fn check_failure(&self, operation: &str) -> Result<()> {
        let injected = self.fail_next.lock().ok().and_then(|mut slot| slot.take());
        match injected {
            Some(message) => {
                tracing::debug!(operation, %message, "Injected store failure");
                Err(StorageError::Unavailable(message).into())
            }
            None => Ok(()),
        }
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    fn claim(state: &mut StoreState, tenant_id: TenantId, entity: &EntityId) -> Result<()> {
        let owner = *state.owners.entry(*entity).or_insert(tenant_id);
        if owner != tenant_id {
            return Err(Error::Api {
                status: 403,
                body: Some(serde_json::json!({
                    "message": format!("Entity {} belongs to another tenant", entity),
                })),
            });
        }
        Ok(())
    }
}

impl Default for MemoryTelemetryStore {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn load_latest_series(
        &self,
        entity: &EntityId,
        keys: Option<&[String]>,
    ) -> Result<Vec<TsKvEntry>> {
        self.check_failure("load_latest_series")?;
        let now = self.now();
        let state = self.state.read().await;
        let Some(series) = state.series.get(entity) else {
            return Ok(Vec::new());
        };

        let keys = keys.unwrap_or(&series.keys);
        Ok(keys
            .iter()
            .filter_map(|key| {
                let latest = series.points.get(key)?.iter().rev().find(|p| p.is_live(now))?;
                Some(TsKvEntry::new(latest.ts, KvEntry::new(key.as_str(), latest.value.clone())))
            })
            .collect())
    }

    async fn load_series(&self, entity: &EntityId, queries: &[PointQuery]) -> Result<Vec<TsKvEntry>> {
        self.check_failure("load_series")?;
        let now = self.now();
        let state = self.state.read().await;
        let Some(series) = state.series.get(entity) else {
            return Ok(Vec::new());
        };

        let mut result = Vec::new();
        for query in queries {
            let Some(points) = series.points.get(&query.key) else {
                continue;
            };
            let window: Vec<&StoredPoint> = points
                .iter()
                .filter(|p| p.ts >= query.start_ts && p.ts < query.end_ts && p.is_live(now))
                .collect();
            result.extend(run_query(query, &window));
        }
        Ok(result)
    }

    async fn load_attributes(
        &self,
        entity: &EntityId,
        scopes: &[AttributeScope],
        keys: Option<&[String]>,
    ) -> Result<Vec<AttributeKvEntry>> {
        self.check_failure("load_attributes")?;
        let state = self.state.read().await;

        Ok(scopes
            .iter()
            .filter_map(|scope| state.attributes.get(&(*entity, *scope)))
            .flatten()
            .filter(|attribute| keys.is_none_or(|keys| keys.iter().any(|k| k == attribute.key())))
            .cloned()
            .collect())
    }

    async fn save_attributes(
        &self,
        tenant_id: TenantId,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &[AttributeKvEntry],
    ) -> Result<()> {
        self.check_failure("save_attributes")?;
        let mut state = self.state.write().await;
        Self::claim(&mut state, tenant_id, entity)?;

        let stored = state.attributes.entry((*entity, scope)).or_default();
        for attribute in attributes {
            match stored.iter_mut().find(|a| a.key() == attribute.key()) {
                Some(existing) => *existing = attribute.clone(),
                None => stored.push(attribute.clone()),
            }
        }
        tracing::debug!(%entity, %scope, count = attributes.len(), "Attributes saved");
        Ok(())
    }

    async fn remove_attributes(
        &self,
        tenant_id: TenantId,
        entity: &EntityId,
        scope: AttributeScope,
        keys: &[String],
    ) -> Result<()> {
        self.check_failure("remove_attributes")?;
        let mut state = self.state.write().await;
        Self::claim(&mut state, tenant_id, entity)?;

        if let Some(stored) = state.attributes.get_mut(&(*entity, scope)) {
            stored.retain(|a| !keys.iter().any(|k| k == a.key()));
        }
        Ok(())
    }

    async fn save_series(&self, entity: &EntityId, points: &[TsKvEntry], ttl_secs: u64) -> Result<()> {
        self.check_failure("save_series")?;
        let now = self.now();
        let expires_at = (ttl_secs > 0)
            .then(|| now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX).saturating_mul(1000)));
        let max_points = self.config.max_points_per_key;

        let mut state = self.state.write().await;
        let series = state.series.entry(*entity).or_default();
        for point in points {
            let key = point.key();
            if !series.points.contains_key(key) {
                series.keys.push(key.to_string());
            }
            let stored = series.points.entry(key.to_string()).or_default();
            stored.retain(|p| p.is_live(now));

            let new_point = StoredPoint {
                ts: point.ts,
                value: point.value().clone(),
                expires_at,
            };
            match stored.binary_search_by_key(&point.ts, |p| p.ts) {
                Ok(i) => stored[i] = new_point,
                Err(i) => stored.insert(i, new_point),
            }
            if stored.len() > max_points {
                let excess = stored.len() - max_points;
                stored.drain(..excess);
            }
        }
        Ok(())
    }
}

fn run_query(query: &PointQuery, window: &[&StoredPoint]) -> Vec<TsKvEntry> {
    let limit = query.limit as usize;
    if query.aggregation == Aggregation::None {
        return window
            .iter()
            .take(limit)
            .map(|p| TsKvEntry::new(p.ts, KvEntry::new(query.key.as_str(), p.value.clone())))
            .collect();
    }

    // Offsets are i128: a window may span the whole i64 range.
    let start = i128::from(query.start_ts);
    let end = i128::from(query.end_ts);
    let width = if query.interval > 0 {
        i128::from(query.interval)
    } else {
        (end - start).max(1)
    };
    let mut buckets: BTreeMap<i128, Vec<&KvValue>> = BTreeMap::new();
    for point in window {
        let index = (i128::from(point.ts) - start) / width;
        buckets.entry(index).or_default().push(&point.value);
    }

    buckets
        .into_iter()
        .filter_map(|(index, values)| {
            let bucket_start = start + index * width;
            let bucket_end = (bucket_start + width).min(end);
            let ts = i64::try_from(bucket_start + (bucket_end - bucket_start) / 2).ok()?;
            aggregate(query.aggregation, &values)
                .map(|value| TsKvEntry::new(ts, KvEntry::new(query.key.as_str(), value)))
        })
        .take(limit)
        .collect()
}

/// Reduce one bucket. Non-numeric values only count towards `Count`; a bucket
/// without numeric values yields nothing for the other modes.
fn aggregate(aggregation: Aggregation, values: &[&KvValue]) -> Option<KvValue> {
    if aggregation == Aggregation::Count {
        return Some(KvValue::Long(values.len() as i64));
    }

    let longs: Option<Vec<i64>> = values
        .iter()
        .map(|v| match v {
            KvValue::Long(l) => Some(*l),
            _ => None,
        })
        .collect();
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if numbers.is_empty() {
        return None;
    }

    Some(match (aggregation, longs) {
        (Aggregation::Sum, Some(longs)) => KvValue::Long(longs.iter().fold(0i64, |acc, l| acc.saturating_add(*l))),
        (Aggregation::Min, Some(longs)) => KvValue::Long(*longs.iter().min()?),
        (Aggregation::Max, Some(longs)) => KvValue::Long(*longs.iter().max()?),
        (Aggregation::Sum, None) => KvValue::Double(numbers.iter().sum()),
        (Aggregation::Min, None) => KvValue::Double(numbers.iter().copied().fold(f64::INFINITY, f64::min)),
        (Aggregation::Max, None) => KvValue::Double(numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        _ => KvValue::Double(numbers.iter().sum::<f64>() / numbers.len() as f64),
    })
}
