//! Audit log sink backed by `tracing`
//!
//! Events go to the `telegate::audit` target so they can be routed
//! separately with a filter directive.

use async_trait::async_trait;
use telegate_core::{AuditEvent, AuditLog};

/// Writes each attribute audit event as one structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl TracingAuditLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn log(&self, event: AuditEvent) {
        let tenant = event.principal.as_ref().map(|p| p.tenant_id.to_string());
        let user = event.principal.as_ref().and_then(|p| p.user_id.clone());
        let scope = event.scope.map(|s| s.as_str());
        let keys = event.keys.as_ref().map(|k| k.join(","));
        let attributes = event
            .attributes
            .iter()
            .map(|a| a.key())
            .collect::<Vec<_>>()
            .join(",");

        match &event.error {
            None => tracing::info!(
                target: "telegate::audit",
                operation = event.operation.as_str(),
                request_id = event.request_id.as_deref(),
                trace_id = event.trace_id.as_deref(),
                entity = %event.entity,
                tenant = tenant.as_deref(),
                user = user.as_deref(),
                scope,
                keys = keys.as_deref(),
                attributes = %attributes,
                "Attribute operation"
            ),
            Some(error) => tracing::warn!(
                target: "telegate::audit",
                operation = event.operation.as_str(),
                request_id = event.request_id.as_deref(),
                trace_id = event.trace_id.as_deref(),
                entity = %event.entity,
                tenant = tenant.as_deref(),
                user = user.as_deref(),
                scope,
                keys = keys.as_deref(),
                attributes = %attributes,
                error = %error,
                "Attribute operation failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telegate_core::{AttributeScope, EntityId, EntityType, Error};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_logs_success_and_failure_without_subscriber() {
        let audit = TracingAuditLog::new();
        let entity = EntityId::new(EntityType::Asset, Uuid::new_v4());

        audit
            .log(
                AuditEvent::read(None, entity, Some(AttributeScope::Server), None)
                    .with_correlation("tg_audit", "0af7651916cd43dd8448eb211c80319c"),
            )
            .await;
        audit
            .log(
                AuditEvent::deleted(None, entity, AttributeScope::Client, vec!["a".into()])
                    .with_error(Some(&Error::Store("down".into()))),
            )
            .await;
    }
}
