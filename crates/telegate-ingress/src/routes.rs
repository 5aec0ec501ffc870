//! HTTP surface of the telemetry API
//!
//! The mount point itself and every path below it are routed to the
//! [`TelemetryService`] handler of the verb, so that short paths reach the
//! path parser and fail there with 400 instead of a routing 404.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::to_bytes,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use bytes::Bytes;
use telegate_core::SecurityContext;

use crate::context::RequestMetadata;
use crate::middleware::security_context_middleware;
use crate::params::QueryParams;
use crate::path::split_path;
use crate::service::{TelemetryRequest, TelemetryService};

/// Default cap on request bodies
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct TelemetryState {
    service: Arc<TelemetryService>,
    base_path: Arc<str>,
    max_body_bytes: usize,
}

impl TelemetryState {
    /// Path below the mount point, empty for the mount point itself
    fn relative_path<'a>(&self, request: &'a Request) -> &'a str {
        request
            .uri()
            .path()
            .strip_prefix(self.base_path.as_ref())
            .unwrap_or_default()
    }
}

/// Router serving `GET`, `POST` and `DELETE` on `base_path`, `base_path/`
/// and `base_path/{*path}`.
///
/// An empty `base_path` mounts the API at the root.
pub fn router(base_path: &str, service: Arc<TelemetryService>, max_body_bytes: usize) -> Router {
    let base = base_path.trim_end_matches('/');
    let endpoints: MethodRouter<TelemetryState> =
        get(get_telemetry).post(post_telemetry).delete(delete_telemetry);

    let mut router = Router::new()
        .route(&format!("{base}/"), endpoints.clone())
        .route(&format!("{base}/{{*path}}"), endpoints.clone());
    if !base.is_empty() {
        router = router.route(base, endpoints);
    }

    router
        .layer(middleware::from_fn(security_context_middleware))
        .with_state(TelemetryState {
            service,
            base_path: Arc::from(base),
            max_body_bytes,
        })
}

async fn get_telemetry(
    State(state): State<TelemetryState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Response {
    let request = telemetry_request(&state, params, &request, Bytes::new());
    state.service.handle_get(&request).await.into_response()
}

async fn post_telemetry(
    State(state): State<TelemetryState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Response {
    let path = split_path(state.relative_path(&request));
    let security = request.extensions().get::<SecurityContext>().cloned();
    let metadata = request.extensions().get::<RequestMetadata>().cloned();
    let body = match to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, limit = state.max_body_bytes, "Rejecting telemetry body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let request = TelemetryRequest {
        path,
        params: QueryParams::new(params),
        body,
        security,
        metadata,
    };
    state.service.handle_post(&request).await.into_response()
}

async fn delete_telemetry(
    State(state): State<TelemetryState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Response {
    let request = telemetry_request(&state, params, &request, Bytes::new());
    state.service.handle_delete(&request).await.into_response()
}

fn telemetry_request(
    state: &TelemetryState,
    params: HashMap<String, String>,
    request: &Request,
    body: Bytes,
) -> TelemetryRequest {
    TelemetryRequest {
        path: split_path(state.relative_path(request)),
        params: QueryParams::new(params),
        body,
        security: request.extensions().get::<SecurityContext>().cloned(),
        metadata: request.extensions().get::<RequestMetadata>().cloned(),
    }
}
