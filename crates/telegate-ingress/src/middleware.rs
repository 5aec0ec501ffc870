//! Telemetry request middleware

use crate::context::{RequestId, RequestMetadata};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use telegate_core::{SecurityContext, TenantId};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Attach [`RequestMetadata`] to the request and echo the request id back.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let metadata = extract_metadata(req.headers());
    let request_id = metadata.request_id.clone();

    tracing::debug!(
        request_id = %request_id,
        trace_id = %metadata.trace.trace_id,
        method = %req.method(),
        uri = %req.uri(),
        "Telemetry request received"
    );

    req.extensions_mut().insert(metadata);
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Resolve the caller's [`SecurityContext`] from `x-tenant-id` / `x-user-id`.
///
/// A request without a tenant header passes through anonymously; handlers that
/// need a tenant reject it. A tenant header that is not a UUID is rejected here.
pub async fn security_context_middleware(mut req: Request, next: Next) -> Response {
    match extract_security_context(req.headers()) {
        Ok(Some(context)) => {
            req.extensions_mut().insert(context);
        }
        Ok(None) => {}
        Err(message) => {
            tracing::debug!(%message, "Rejecting request with invalid security headers");
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    }
    next.run(req).await
}

pub fn extract_metadata(headers: &HeaderMap) -> RequestMetadata {
    let mut metadata = RequestMetadata::new();

    if let Some(id) = header_str(headers, REQUEST_ID_HEADER) {
        metadata = metadata.with_request_id(RequestId::from_header(id));
    }
    if let Some(traceparent) = header_str(headers, "traceparent") {
        metadata = metadata.with_traceparent(traceparent);
    }

    metadata
}

pub fn extract_security_context(headers: &HeaderMap) -> Result<Option<SecurityContext>, String> {
    let Some(tenant) = header_str(headers, TENANT_ID_HEADER) else {
        return Ok(None);
    };
    let tenant_id = TenantId::from_string(tenant.trim()).map_err(|e| e.to_string())?;

    let mut context = SecurityContext::new(tenant_id);
    if let Some(user) = header_str(headers, USER_ID_HEADER).map(str::trim).filter(|u| !u.is_empty()) {
        context = context.with_user_id(user);
    }
    Ok(Some(context))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
