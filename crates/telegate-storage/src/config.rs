//! Storage configuration

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Default retention cap per series key
pub const DEFAULT_MAX_POINTS_PER_KEY: usize = 100_000;

/// Default capacity of the subscription channel
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Points kept per (entity, key); the oldest are dropped first
    pub max_points_per_key: usize,
    /// Updates buffered per subscriber before it starts lagging
    pub notification_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_points_per_key: DEFAULT_MAX_POINTS_PER_KEY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_points_per_key == 0 {
            return Err(StorageError::Config(
                "max_points_per_key must be greater than 0".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(StorageError::Config(
                "notification_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
