//! Common test utilities for integration tests

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    middleware,
    http::{Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use telegate_core::{
    AttributeKvEntry, AttributeScope, AuditEvent, AuditLog, EntityId, SubscriptionNotifier,
    TelemetryUpdate, TsKvEntry,
};
use telegate_ingress::{TelemetryService, middleware::request_context_middleware, routes};
use telegate_observability::Metrics;
use telegate_storage::{MemoryTelemetryStore, StorageConfig};
use tower::ServiceExt;

pub const BASE: &str = "/api/plugins/telemetry";
pub const TENANT: &str = "7d4c1a2e-3b5f-4e6a-9c8d-1f2e3a4b5c6d";
pub const OTHER_TENANT: &str = "0f9e8d7c-6b5a-4c3d-8e2f-1a0b9c8d7e6f";
pub const DEVICE: &str = "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d";

/// Notifier that keeps every update it receives
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingNotifier {
    updates: Mutex<Vec<TelemetryUpdate>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn updates(&self) -> Vec<TelemetryUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl SubscriptionNotifier for RecordingNotifier {
    fn on_attributes_updated(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &[AttributeKvEntry],
    ) {
        self.updates.lock().unwrap().push(TelemetryUpdate::Attributes {
            entity: *entity,
            scope,
            attributes: attributes.to_vec(),
        });
    }

    fn on_series_updated(&self, entity: &EntityId, points: &[TsKvEntry]) {
        self.updates.lock().unwrap().push(TelemetryUpdate::Timeseries {
            entity: *entity,
            points: points.to_vec(),
        });
    }
}

/// Audit log that keeps every event it receives
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

#[allow(dead_code)]
impl RecordingAuditLog {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn log(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTelemetryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAuditLog>,
    pub metrics: Arc<Metrics>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_body_limit(routes::DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_body_limit(max_body_bytes: usize) -> Self {
        let store = Arc::new(MemoryTelemetryStore::new(StorageConfig::default()));
        let notifier = Arc::new(RecordingNotifier::default());
        let audit = Arc::new(RecordingAuditLog::default());
        let metrics = Arc::new(Metrics::new().unwrap());

        let service = TelemetryService::new(store.clone(), audit.clone())
            .with_notifier(notifier.clone())
            .with_metrics(metrics.clone());
        let router = routes::router(BASE, Arc::new(service), max_body_bytes)
            .layer(middleware::from_fn(request_context_middleware));

        Self {
            router,
            store,
            notifier,
            audit,
            metrics,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.send(Request::builder().uri(format!("{BASE}{path}")).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, path: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}{path}"))
                .header("x-tenant-id", TENANT)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(format!("{BASE}{path}"))
                .header("x-tenant-id", TENANT)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status for response");
}
