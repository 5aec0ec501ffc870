//! Application wiring: store, notifier, audit, metrics and routers

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, extract::Request, middleware};
use telegate_core::{AuditLog, EntityId, EntityType, Error, Result, TelemetryStore};
use telegate_ingress::{
    RequestMetadata, TelemetryService, middleware::request_context_middleware, routes,
};
use telegate_observability::{
    ComponentStatus, HealthState, Metrics, ReadinessChecker, TracingAuditLog, health_router,
};
use telegate_storage::{BroadcastNotifier, MemoryTelemetryStore};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Shared handles of a running application
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryTelemetryStore>,
    pub notifier: BroadcastNotifier,
    pub metrics: Arc<Metrics>,
    pub service: Arc<TelemetryService>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = Arc::new(MemoryTelemetryStore::new(config.storage.clone()));
        let notifier = BroadcastNotifier::new(config.storage.notification_capacity);
        let metrics = Arc::new(
            Metrics::new().map_err(|e| Error::Internal(format!("Failed to register metrics: {}", e)))?,
        );
        let audit: Arc<dyn AuditLog> = Arc::new(TracingAuditLog::new());

        let service = TelemetryService::new(store.clone(), audit)
            .with_notifier(Arc::new(notifier.clone()))
            .with_metrics(metrics.clone())
            .with_default_limit(config.telemetry.default_limit);

        Ok(Self {
            store,
            notifier,
            metrics,
            service: Arc::new(service),
        })
    }
}

/// Readiness check issuing a cheap latest-value read against the store
pub struct StoreReadiness {
    store: Arc<dyn TelemetryStore>,
}

impl StoreReadiness {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessChecker for StoreReadiness {
    async fn check(&self) -> ComponentStatus {
        let sentinel = EntityId::new(EntityType::Device, uuid::Uuid::nil());
        match self.store.load_latest_series(&sentinel, Some(&[])).await {
            Ok(_) => ComponentStatus::healthy("telemetry_store"),
            Err(e) => ComponentStatus::unhealthy("telemetry_store", e.to_string()),
        }
    }
}

/// Build the full HTTP application for `config`.
pub fn build_app(config: &ServerConfig, state: &AppState) -> Router {
    let telemetry = routes::router(
        &config.base_path,
        state.service.clone(),
        config.telemetry.max_body_bytes,
    );

    let health = HealthState::new(state.metrics.clone())
        .with_checker(Arc::new(StoreReadiness::new(state.store.clone())));

    Router::new()
        .merge(telemetry)
        .merge(health_router(health))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(request_context_middleware))
}

/// Request span carrying the correlation ids set by the request-context layer
fn request_span(request: &Request) -> tracing::Span {
    let metadata = request.extensions().get::<RequestMetadata>();
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = metadata.map(|m| m.request_id.as_str()),
        trace_id = metadata.map(|m| m.trace.trace_id.as_str()),
        span_id = metadata.map(|m| m.trace.span_id.as_str()),
        parent_span_id = metadata.and_then(|m| m.trace.parent_span_id.as_deref()),
    )
}
