//! Entity references
//!
//! An `EntityId` is the subject of every telemetry request: a tag from the
//! closed `EntityType` enumeration plus a UUID. Construction fails for tags
//! outside the enumeration or ids that are not UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Closed set of entity kinds that can own telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Tenant,
    Customer,
    User,
    Dashboard,
    Asset,
    Device,
    Alarm,
    Rule,
    Plugin,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Tenant,
        EntityType::Customer,
        EntityType::User,
        EntityType::Dashboard,
        EntityType::Asset,
        EntityType::Device,
        EntityType::Alarm,
        EntityType::Rule,
        EntityType::Plugin,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Tenant => "TENANT",
            EntityType::Customer => "CUSTOMER",
            EntityType::User => "USER",
            EntityType::Dashboard => "DASHBOARD",
            EntityType::Asset => "ASSET",
            EntityType::Device => "DEVICE",
            EntityType::Alarm => "ALARM",
            EntityType::Rule => "RULE",
            EntityType::Plugin => "PLUGIN",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    /// Tags are matched case-sensitively against their upper-case names.
    fn from_str(s: &str) -> Result<Self> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::malformed(format!("Unknown entity type: {}", s)))
    }
}

/// Typed reference to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl EntityId {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }

    /// Build an entity reference from its path tokens
    pub fn from_parts(entity_type: &str, id: &str) -> Result<Self> {
        let entity_type = entity_type.parse::<EntityType>()?;
        let id = Uuid::parse_str(id)
            .map_err(|e| Error::malformed(format!("Invalid entity id '{}': {}", id, e)))?;
        Ok(Self { entity_type, id })
    }

    /// Device reference from a bare id, used by the short write/delete paths
    pub fn device(id: &str) -> Result<Self> {
        Self::from_parts(EntityType::Device.as_str(), id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.id)
    }
}
