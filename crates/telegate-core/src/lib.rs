//! Telegate Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout Telegate:
//! - Entity references, attribute scopes and typed key/value entries
//! - Point queries and aggregation modes for windowed reads
//! - Collaborator traits for the telemetry store, subscription notifier and audit log
//! - Core error types

pub mod audit;
pub mod entity;
pub mod error;
pub mod kv;
pub mod notifier;
pub mod query;
pub mod scope;
pub mod telemetry_store;
pub mod tenant;

pub use audit::{AuditEvent, AuditLog, AuditOperation};
pub use entity::{EntityId, EntityType};
pub use error::{Error, Result};
pub use kv::{AttributeKvEntry, KvEntry, KvValue, TsKvEntry};
pub use notifier::{NoopNotifier, SubscriptionNotifier, TelemetryUpdate};
pub use query::{Aggregation, DEFAULT_LIMIT, Feature, PointQuery};
pub use scope::AttributeScope;
pub use telemetry_store::TelemetryStore;
pub use tenant::{SecurityContext, TenantId};
