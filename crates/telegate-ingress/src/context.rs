//! Per-request context carried through the telemetry surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation id attached to every telemetry request and echoed back
/// in the `x-request-id` response header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("tg_{}", Uuid::new_v4().simple()))
    }

    /// Reuse a caller-supplied id. Blank or oversized values are replaced.
    pub fn from_header(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.len() > 128 {
            Self::generate()
        } else {
            Self(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// W3C trace context of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    /// Span id assigned to this request
    pub span_id: String,
    /// Caller's span, when the request continued a trace
    pub parent_span_id: Option<String>,
}

impl TraceContext {
    /// Start a new trace rooted at this request.
    pub fn generate() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: format!("{:016x}", rand::random::<u64>()),
            parent_span_id: None,
        }
    }

    /// Continue the trace described by a `traceparent` header.
    ///
    /// Returns `None` for anything that is not `version-trace-parent-flags`
    /// with hex fields of the expected widths.
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let [_version, trace_id, parent_id, flags] = header.split('-').collect::<Vec<_>>()[..]
        else {
            return None;
        };
        let is_hex = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit());
        if !is_hex(trace_id, 32) || !is_hex(parent_id, 16) || !is_hex(flags, 2) {
            return None;
        }

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: format!("{:016x}", rand::random::<u64>()),
            parent_span_id: Some(parent_id.to_ascii_lowercase()),
        })
    }
}

/// Correlation data inserted into request extensions by
/// [`crate::middleware::request_context_middleware`], recorded on the request
/// span and on audit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub request_id: RequestId,
    pub trace: TraceContext,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
            trace: TraceContext::generate(),
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_traceparent(mut self, header: &str) -> Self {
        if let Some(trace) = TraceContext::from_traceparent(header) {
            self.trace = trace;
        }
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation_is_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("tg_"));
    }

    #[test]
    fn test_request_id_from_header() {
        assert_eq!(RequestId::from_header(" abc-123 ").as_str(), "abc-123");
        assert!(RequestId::from_header("").as_str().starts_with("tg_"));
        assert!(RequestId::from_header(&"x".repeat(200)).as_str().starts_with("tg_"));
    }

    #[test]
    fn test_traceparent_continues_caller_trace() {
        let header = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";
        let trace = TraceContext::from_traceparent(header).unwrap();

        assert_eq!(trace.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(trace.parent_span_id.as_deref(), Some("b7ad6b7169203331"));
        assert_ne!(trace.span_id, "b7ad6b7169203331");
    }

    #[test]
    fn test_invalid_traceparent() {
        assert!(TraceContext::from_traceparent("garbage").is_none());
        assert!(TraceContext::from_traceparent("00-abc-def-01").is_none());
        assert!(
            TraceContext::from_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-zz")
                .is_none()
        );
    }

    #[test]
    fn test_metadata_ignores_bad_traceparent() {
        let metadata = RequestMetadata::new();
        let trace_id = metadata.trace.trace_id.clone();
        let metadata = metadata.with_traceparent("nope");
        assert_eq!(metadata.trace.trace_id, trace_id);
    }
}
