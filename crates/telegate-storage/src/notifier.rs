//! Broadcast subscription hub

use telegate_core::{
    AttributeKvEntry, AttributeScope, EntityId, SubscriptionNotifier, TelemetryUpdate, TsKvEntry,
};
use tokio::sync::broadcast;

/// Fans confirmed writes out to every live subscriber.
///
/// Sending never waits: slow subscribers lag and lose the oldest updates, and
/// an update with no subscribers is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<TelemetryUpdate>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryUpdate> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, update: TelemetryUpdate) {
        let kind = update.kind();
        let entity = *update.entity();
        match self.sender.send(update) {
            Ok(receivers) => tracing::debug!(%entity, kind, receivers, "Telemetry update published"),
            Err(_) => tracing::trace!(%entity, kind, "No subscribers for telemetry update"),
        }
    }
}

impl SubscriptionNotifier for BroadcastNotifier {
    fn on_attributes_updated(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &[AttributeKvEntry],
    ) {
        self.publish(TelemetryUpdate::Attributes {
            entity: *entity,
            scope,
            attributes: attributes.to_vec(),
        });
    }

    fn on_series_updated(&self, entity: &EntityId, points: &[TsKvEntry]) {
        self.publish(TelemetryUpdate::Timeseries {
            entity: *entity,
            points: points.to_vec(),
        });
    }
}
