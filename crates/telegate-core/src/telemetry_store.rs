//! Telemetry store trait
//!
//! The `TelemetryStore` trait abstracts the backing storage engine for
//! time-series points and attributes. Every operation is asynchronous: the
//! returned future resolves exactly once, with the result or the failure,
//! after the store has finished the call. Callers never block on it.

use async_trait::async_trait;

use crate::{
    AttributeKvEntry, AttributeScope, EntityId, PointQuery, Result, TenantId, TsKvEntry,
};

/// Telemetry store trait
///
/// Implementations:
/// - `MemoryTelemetryStore`: in-process store (telegate-storage)
///
/// # Example
/// ```no_run
/// # use telegate_core::{EntityId, TelemetryStore};
/// # async fn example(store: &dyn TelemetryStore, entity: EntityId) -> telegate_core::Result<()> {
/// // Most recent sample of every known key
/// let latest = store.load_latest_series(&entity, None).await?;
///
/// // Most recent sample of selected keys
/// let keys = vec!["temperature".to_string()];
/// let latest = store.load_latest_series(&entity, Some(&keys)).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Load the most recent point of each key
    ///
    /// # Arguments
    /// * `entity` - Entity owning the series
    /// * `keys` - Keys to load; `None` loads every known key
    ///
    /// # Errors
    /// - `Error::Store` for read errors
    async fn load_latest_series(
        &self,
        entity: &EntityId,
        keys: Option<&[String]>,
    ) -> Result<Vec<TsKvEntry>>;

    /// Run windowed point queries
    ///
    /// Points are returned grouped per query, chronological within a key.
    ///
    /// # Errors
    /// - `Error::Store` for read errors
    async fn load_series(&self, entity: &EntityId, queries: &[PointQuery])
    -> Result<Vec<TsKvEntry>>;

    /// Load attributes from one or more scopes
    ///
    /// # Arguments
    /// * `entity` - Entity owning the attributes
    /// * `scopes` - Scopes to search, in order
    /// * `keys` - Keys to load; `None` loads every attribute in the scopes
    ///
    /// # Errors
    /// - `Error::Store` for read errors
    async fn load_attributes(
        &self,
        entity: &EntityId,
        scopes: &[AttributeScope],
        keys: Option<&[String]>,
    ) -> Result<Vec<AttributeKvEntry>>;

    /// Save attributes into a scope, replacing existing values of the same keys
    ///
    /// # Errors
    /// - `Error::Store` for write errors
    async fn save_attributes(
        &self,
        tenant_id: TenantId,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &[AttributeKvEntry],
    ) -> Result<()>;

    /// Remove attributes from a scope; unknown keys are ignored
    ///
    /// # Errors
    /// - `Error::Store` for write errors
    async fn remove_attributes(
        &self,
        tenant_id: TenantId,
        entity: &EntityId,
        scope: AttributeScope,
        keys: &[String],
    ) -> Result<()>;

    /// Save time-series points
    ///
    /// # Arguments
    /// * `entity` - Entity owning the series
    /// * `points` - Points to append
    /// * `ttl_secs` - Time to live of the written points; 0 keeps them forever
    ///
    /// # Errors
    /// - `Error::Store` for write errors
    async fn save_series(&self, entity: &EntityId, points: &[TsKvEntry], ttl_secs: u64)
    -> Result<()>;
}
