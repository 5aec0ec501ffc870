//! Health endpoints
//!
//! - `/healthz` - Liveness check
//! - `/readyz` - Readiness check, backed by the registered component checks
//! - `/metrics` - Prometheus metrics endpoint

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub components: Vec<ComponentStatus>,
}

/// Health of one backing component, e.g. the telemetry store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            detail: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// Probe run on every `/readyz` request
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn check(&self) -> ComponentStatus;
}

#[derive(Clone)]
pub struct HealthState {
    pub metrics: Arc<Metrics>,
    pub checkers: Vec<Arc<dyn ReadinessChecker>>,
}

impl HealthState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            checkers: Vec::new(),
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn ReadinessChecker>) -> Self {
        self.checkers.push(checker);
        self
    }
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// 200 when every component is healthy, 503 otherwise
async fn readyz(State(state): State<HealthState>) -> Response {
    let mut components = Vec::with_capacity(state.checkers.len());
    for checker in &state.checkers {
        components.push(checker.check().await);
    }

    let ready = components.iter().all(|c| c.healthy);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(ReadinessResponse {
            status: label.to_string(),
            components,
        }),
    )
        .into_response()
}

async fn metrics_handler(State(state): State<HealthState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}
