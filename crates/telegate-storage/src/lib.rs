//! Telegate Storage
//!
//! This crate provides the in-process collaborators of the telemetry API:
//! - Memory telemetry store (latest, windowed and aggregated reads, TTL)
//! - Broadcast subscription notifier

pub mod config;
pub mod error;
pub mod memory;
pub mod notifier;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryTelemetryStore;
pub use notifier::BroadcastNotifier;
