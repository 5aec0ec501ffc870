//! Subscription notifier trait
//!
//! After the store confirms a write, the dispatcher tells the notifier so that
//! live subscribers receive the update. Notification is fire-and-forget: the
//! methods must return promptly and never fail the originating request.

use serde::{Deserialize, Serialize};

use crate::{AttributeKvEntry, AttributeScope, EntityId, TsKvEntry};

/// Update delivered to live subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryUpdate {
    Attributes {
        entity: EntityId,
        scope: AttributeScope,
        attributes: Vec<AttributeKvEntry>,
    },
    Timeseries {
        entity: EntityId,
        points: Vec<TsKvEntry>,
    },
}

impl TelemetryUpdate {
    pub fn entity(&self) -> &EntityId {
        match self {
            TelemetryUpdate::Attributes { entity, .. } => entity,
            TelemetryUpdate::Timeseries { entity, .. } => entity,
        }
    }

    /// Label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryUpdate::Attributes { .. } => "attributes",
            TelemetryUpdate::Timeseries { .. } => "timeseries",
        }
    }
}

/// Receiver of confirmed writes.
///
/// Both methods run inline on the request path, after the store confirmed the
/// write and before the response is returned. Implementations must not block
/// or await: hand the update off (a bounded channel `try_send`, a broadcast
/// `send`, a spawned task) and return. Delivery failures are the notifier's
/// own concern and never reach the caller.
pub trait SubscriptionNotifier: Send + Sync {
    /// Attributes were written to `scope` by the server
    fn on_attributes_updated(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &[AttributeKvEntry],
    );

    /// Time-series points were written by the server
    fn on_series_updated(&self, entity: &EntityId, points: &[TsKvEntry]);
}

/// Notifier for deployments without live subscriptions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl SubscriptionNotifier for NoopNotifier {
    fn on_attributes_updated(&self, _: &EntityId, _: AttributeScope, _: &[AttributeKvEntry]) {}

    fn on_series_updated(&self, _: &EntityId, _: &[TsKvEntry]) {}
}
