//! Telegate Observability
//!
//! This crate provides observability features:
//! - Metrics collection (Prometheus)
//! - Structured logging setup
//! - Audit logging of attribute operations
//! - Health endpoints

pub mod audit;
pub mod health;
pub mod logging;
pub mod metrics;

pub use audit::TracingAuditLog;
pub use health::{ComponentStatus, HealthResponse, HealthState, ReadinessChecker, ReadinessResponse, health_router};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use metrics::Metrics;
