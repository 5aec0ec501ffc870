//! Storage errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for telegate_core::Error {
    fn from(err: StorageError) -> Self {
        telegate_core::Error::Store(err.to_string())
    }
}
