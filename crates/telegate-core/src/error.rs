//! Error types for Telegate Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad path shape or arity, unknown entity type, feature or scope token
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Incomplete parameter group, unsupported numeric range, empty payload
    #[error("{0}")]
    Validation(String),

    /// Request body could not be parsed as JSON at all
    #[error("{0}")]
    InvalidPayload(String),

    /// Domain error that knows its own response shape
    #[error("API error ({status})")]
    Api {
        status: u16,
        body: Option<serde_json::Value>,
    },

    /// Backing store call failed
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    // Multi-tenancy errors
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    #[error("Tenant required: {0}")]
    TenantRequired(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Shorthand for a malformed request
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedRequest(message.into())
    }

    /// Whether this error belongs to the validation/argument class, which is
    /// reported to the caller as 400 with the message as body.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::InvalidPayload(_) | Error::TenantRequired(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
