//! Per-verb dispatch of telemetry requests
//!
//! Every handler produces exactly one [`TelemetryResponse`]. Parsing failures
//! and store failures both end in [`handle_error`] with a status chosen by the
//! handler, and the notifier hears only about writes the store confirmed.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use bytes::Bytes;
use telegate_core::{
    AttributeScope, AuditEvent, AuditLog, DEFAULT_LIMIT, EntityId, Feature, NoopNotifier,
    Result, SecurityContext, SubscriptionNotifier, TelemetryStore,
};
use telegate_observability::Metrics;

use crate::coerce::parse_attributes_payload;
use crate::context::RequestMetadata;
use crate::params::QueryParams;
use crate::path::{
    TelemetryCommand, parse_delete_path, parse_read_path, parse_write_path, split_path,
};
use crate::query::{SeriesParams, SeriesRead, build_queries};
use crate::reshape::{attribute_keys, attribute_values, group_series, series_keys};
use crate::response::{TelemetryResponse, handle_error};
use crate::upload::parse_series_payload;

/// A telemetry request as handed over by the transport
#[derive(Debug, Clone, Default)]
pub struct TelemetryRequest {
    /// Path segments below the telemetry base path
    pub path: Vec<String>,
    pub params: QueryParams,
    pub body: Bytes,
    pub security: Option<SecurityContext>,
    /// Correlation ids stamped on audit events
    pub metadata: Option<RequestMetadata>,
}

impl TelemetryRequest {
    pub fn new(path: &str) -> Self {
        Self {
            path: split_path(path),
            ..Default::default()
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_security(mut self, security: SecurityContext) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn correlate(&self, event: AuditEvent) -> AuditEvent {
        match &self.metadata {
            Some(metadata) => {
                event.with_correlation(metadata.request_id.as_str(), metadata.trace.trace_id.as_str())
            }
            None => event,
        }
    }
}

pub struct TelemetryService {
    store: Arc<dyn TelemetryStore>,
    notifier: Arc<dyn SubscriptionNotifier>,
    audit: Arc<dyn AuditLog>,
    metrics: Option<Arc<Metrics>>,
    default_limit: u32,
}

impl TelemetryService {
    pub fn new(store: Arc<dyn TelemetryStore>, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
            audit,
            metrics: None,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SubscriptionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Limit applied to windowed reads that do not pass `limit`
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub async fn handle_get(&self, request: &TelemetryRequest) -> TelemetryResponse {
        let response = match parse_read_path(&request.path, &request.params) {
            Ok(command) => {
                self.record_request("GET", command.feature());
                self.read(command, request).await
            }
            Err(e) => handle_error(Some(&e), StatusCode::BAD_REQUEST),
        };
        self.finish("GET", response)
    }

    pub async fn handle_post(&self, request: &TelemetryRequest) -> TelemetryResponse {
        let response = match parse_write_path(&request.path) {
            Ok(command) => {
                self.record_request("POST", command.feature());
                self.write(command, request).await
            }
            Err(e) => handle_error(Some(&e), StatusCode::BAD_REQUEST),
        };
        self.finish("POST", response)
    }

    pub async fn handle_delete(&self, request: &TelemetryRequest) -> TelemetryResponse {
        let response = match parse_delete_path(&request.path, &request.params) {
            Ok(command) => {
                self.record_request("DELETE", command.feature());
                self.delete(command, request).await
            }
            Err(e) => handle_error(Some(&e), StatusCode::BAD_REQUEST),
        };
        self.finish("DELETE", response)
    }

    async fn read(&self, command: TelemetryCommand, request: &TelemetryRequest) -> TelemetryResponse {
        match command {
            TelemetryCommand::KeysRead {
                entity,
                feature: Feature::Timeseries,
                ..
            } => {
                let loaded = self
                    .timed("load_latest_series", self.store.load_latest_series(&entity, None))
                    .await;
                respond(loaded.map(|points| series_keys(&points)), StatusCode::INTERNAL_SERVER_ERROR)
            }
            TelemetryCommand::KeysRead {
                entity,
                feature: Feature::Attributes,
                scope,
            } => {
                let scopes = resolve_scopes(scope);
                let loaded = self
                    .timed("load_attributes", self.store.load_attributes(&entity, &scopes, None))
                    .await;
                respond(
                    loaded.map(|attributes| attribute_keys(&attributes)),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
            TelemetryCommand::ValuesRead {
                entity,
                feature: Feature::Timeseries,
                keys,
                ..
            } => match series_read(keys, &request.params, self.default_limit) {
                Ok(read) => self.read_series(entity, read).await,
                Err(e) => handle_error(Some(&e), StatusCode::BAD_REQUEST),
            },
            TelemetryCommand::ValuesRead {
                entity,
                feature: Feature::Attributes,
                scope,
                keys,
            } => {
                let scopes = resolve_scopes(scope);
                let loaded = self
                    .timed(
                        "load_attributes",
                        self.store.load_attributes(&entity, &scopes, keys.as_deref()),
                    )
                    .await;
                let event = AuditEvent::read(request.security.as_ref(), entity, scope, keys);
                self.audit
                    .log(request.correlate(event).with_error(loaded.as_ref().err()))
                    .await;
                respond(loaded.map(attribute_values), StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => {
                tracing::warn!(command = ?other, "Write command routed to the read handler");
                handle_error(None, StatusCode::BAD_REQUEST)
            }
        }
    }

    async fn read_series(&self, entity: EntityId, read: SeriesRead) -> TelemetryResponse {
        let loaded = match read {
            SeriesRead::Latest { keys } => {
                self.timed(
                    "load_latest_series",
                    self.store.load_latest_series(&entity, keys.as_deref()),
                )
                .await
            }
            SeriesRead::Windowed(queries) => {
                self.timed("load_series", self.store.load_series(&entity, &queries))
                    .await
            }
        };
        respond(loaded.map(group_series), StatusCode::INTERNAL_SERVER_ERROR)
    }

    async fn write(&self, command: TelemetryCommand, request: &TelemetryRequest) -> TelemetryResponse {
        let tenant_id = match SecurityContext::require_tenant(request.security.as_ref()) {
            Ok(tenant_id) => tenant_id,
            Err(e) => return handle_error(Some(&e), StatusCode::BAD_REQUEST),
        };

        match command {
            TelemetryCommand::AttributesWrite { entity, scope } => {
                let attributes = match parse_attributes_payload(&request.body) {
                    Ok(attributes) => attributes,
                    Err(e) => return handle_error(Some(&e), StatusCode::BAD_REQUEST),
                };
                let saved = self
                    .timed(
                        "save_attributes",
                        self.store.save_attributes(tenant_id, &entity, scope, &attributes),
                    )
                    .await;

                let event = AuditEvent::updated(request.security.as_ref(), entity, scope, attributes.clone());
                self.audit
                    .log(request.correlate(event).with_error(saved.as_ref().err()))
                    .await;

                match saved {
                    Ok(()) => {
                        self.notifier.on_attributes_updated(&entity, scope, &attributes);
                        self.record_notification(Feature::Attributes);
                        TelemetryResponse::ok()
                    }
                    Err(e) => handle_error(Some(&e), StatusCode::BAD_REQUEST),
                }
            }
            TelemetryCommand::TimeseriesWrite { entity, ttl_secs } => {
                let points = match parse_series_payload(&request.body) {
                    Ok(points) => points,
                    Err(e) => return handle_error(Some(&e), StatusCode::BAD_REQUEST),
                };
                let saved = self
                    .timed("save_series", self.store.save_series(&entity, &points, ttl_secs))
                    .await;

                match saved {
                    Ok(()) => {
                        tracing::debug!(%entity, %tenant_id, points = points.len(), "Series saved");
                        self.notifier.on_series_updated(&entity, &points);
                        self.record_notification(Feature::Timeseries);
                        TelemetryResponse::ok()
                    }
                    Err(e) => handle_error(Some(&e), StatusCode::INTERNAL_SERVER_ERROR),
                }
            }
            other => {
                tracing::warn!(command = ?other, "Non-write command routed to the write handler");
                handle_error(None, StatusCode::BAD_REQUEST)
            }
        }
    }

    async fn delete(&self, command: TelemetryCommand, request: &TelemetryRequest) -> TelemetryResponse {
        let TelemetryCommand::AttributesDelete {
            entity,
            scope,
            keys: Some(keys),
        } = command
        else {
            return handle_error(None, StatusCode::BAD_REQUEST);
        };
        let tenant_id = match SecurityContext::require_tenant(request.security.as_ref()) {
            Ok(tenant_id) => tenant_id,
            Err(e) => return handle_error(Some(&e), StatusCode::BAD_REQUEST),
        };

        let removed = self
            .timed(
                "remove_attributes",
                self.store.remove_attributes(tenant_id, &entity, scope, &keys),
            )
            .await;
        let event = AuditEvent::deleted(request.security.as_ref(), entity, scope, keys);
        self.audit
            .log(request.correlate(event).with_error(removed.as_ref().err()))
            .await;

        match removed {
            Ok(()) => TelemetryResponse::ok(),
            Err(e) => handle_error(Some(&e), StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    async fn timed<T>(&self, operation: &'static str, call: impl Future<Output = Result<T>>) -> Result<T> {
        let started = Instant::now();
        let result = call.await;
        if let Some(metrics) = &self.metrics {
            metrics.record_store_call(operation, started.elapsed().as_secs_f64());
        }
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Telemetry store call failed");
        }
        result
    }

    fn record_request(&self, verb: &str, feature: Feature) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(verb, feature.as_str());
        }
    }

    fn record_notification(&self, feature: Feature) {
        if let Some(metrics) = &self.metrics {
            metrics.record_notification(feature.as_str());
        }
    }

    fn finish(&self, verb: &str, response: TelemetryResponse) -> TelemetryResponse {
        if let Some(metrics) = &self.metrics {
            metrics.record_response(verb, response.status.as_u16());
        }
        response
    }
}

/// An unscoped attribute read searches every namespace.
fn resolve_scopes(scope: Option<AttributeScope>) -> Vec<AttributeScope> {
    match scope {
        Some(scope) => vec![scope],
        None => AttributeScope::ALL.to_vec(),
    }
}

fn series_read(keys: Option<Vec<String>>, params: &QueryParams, default_limit: u32) -> Result<SeriesRead> {
    let params = SeriesParams {
        keys,
        ..SeriesParams::from_query(params)?
    };
    build_queries(params, default_limit)
}

fn respond<T: serde::Serialize>(result: Result<T>, failure_status: StatusCode) -> TelemetryResponse {
    match result {
        Ok(payload) => TelemetryResponse::json(&payload),
        Err(e) => handle_error(Some(&e), failure_status),
    }
}
