//! Telegate Ingress
//!
//! This crate turns externally addressed telemetry requests into typed store
//! calls and turns the results back into responses:
//! - Path routing into telemetry commands (`path`)
//! - Query parameter access (`params`)
//! - Windowed query building (`query`)
//! - Attribute payload coercion (`coerce`) and series upload parsing (`upload`)
//! - Result reshaping (`reshape`) and error mapping (`response`)
//! - Per-verb dispatch (`service`) and the HTTP surface (`routes`, `middleware`)

pub mod coerce;
pub mod context;
pub mod middleware;
pub mod params;
pub mod path;
pub mod query;
pub mod reshape;
pub mod response;
pub mod routes;
pub mod service;
pub mod upload;

pub use context::{RequestId, RequestMetadata, TraceContext};
pub use path::{ReadMethod, TelemetryCommand};
pub use response::{ResponseBody, TelemetryResponse, handle_error};
pub use service::{TelemetryRequest, TelemetryService};
