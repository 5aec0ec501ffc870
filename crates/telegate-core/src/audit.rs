//! Audit log trait
//!
//! Attribute reads, writes and deletes are reported to the audit log on both
//! success and failure, before the response is produced.

use async_trait::async_trait;
use serde::Serialize;

use crate::{AttributeKvEntry, AttributeScope, EntityId, Error, SecurityContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    AttributesRead,
    AttributesUpdated,
    AttributesDeleted,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::AttributesRead => "attributes_read",
            AuditOperation::AttributesUpdated => "attributes_updated",
            AuditOperation::AttributesDeleted => "attributes_deleted",
        }
    }
}

/// One audited attribute operation
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub operation: AuditOperation,
    pub principal: Option<SecurityContext>,
    pub entity: EntityId,
    /// `None` when every scope was searched
    pub scope: Option<AttributeScope>,
    /// Keys read or deleted; `None` when a read selected every key
    pub keys: Option<Vec<String>>,
    /// Records written by an update
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeKvEntry>,
    /// Failure message when the store call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl AuditEvent {
    pub fn read(
        principal: Option<&SecurityContext>,
        entity: EntityId,
        scope: Option<AttributeScope>,
        keys: Option<Vec<String>>,
    ) -> Self {
        Self {
            operation: AuditOperation::AttributesRead,
            principal: principal.cloned(),
            entity,
            scope,
            keys,
            attributes: Vec::new(),
            error: None,
            request_id: None,
            trace_id: None,
        }
    }

    pub fn updated(
        principal: Option<&SecurityContext>,
        entity: EntityId,
        scope: AttributeScope,
        attributes: Vec<AttributeKvEntry>,
    ) -> Self {
        Self {
            operation: AuditOperation::AttributesUpdated,
            principal: principal.cloned(),
            entity,
            scope: Some(scope),
            keys: None,
            attributes,
            error: None,
            request_id: None,
            trace_id: None,
        }
    }

    pub fn deleted(
        principal: Option<&SecurityContext>,
        entity: EntityId,
        scope: AttributeScope,
        keys: Vec<String>,
    ) -> Self {
        Self {
            operation: AuditOperation::AttributesDeleted,
            principal: principal.cloned(),
            entity,
            scope: Some(scope),
            keys: Some(keys),
            attributes: Vec::new(),
            error: None,
            request_id: None,
            trace_id: None,
        }
    }

    /// Tie the event to the request that caused it
    pub fn with_correlation(mut self, request_id: impl Into<String>, trace_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Attach the failure of the audited operation
    pub fn with_error(mut self, error: Option<&Error>) -> Self {
        self.error = error.map(|e| e.to_string());
        self
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn log(&self, event: AuditEvent);
}
