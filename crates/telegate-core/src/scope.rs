//! Attribute scopes (namespaces)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Partition of attribute storage with its own permission rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeScope {
    /// Reported by the device itself; readable and deletable, never written here
    #[serde(rename = "CLIENT_SCOPE")]
    Client,
    /// Server-authoritative
    #[serde(rename = "SERVER_SCOPE")]
    Server,
    /// Shared with the device
    #[serde(rename = "SHARED_SCOPE")]
    Shared,
}

impl AttributeScope {
    /// Every namespace, in the order an unscoped read queries them
    pub const ALL: [AttributeScope; 3] = [
        AttributeScope::Client,
        AttributeScope::Server,
        AttributeScope::Shared,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeScope::Client => "CLIENT_SCOPE",
            AttributeScope::Server => "SERVER_SCOPE",
            AttributeScope::Shared => "SHARED_SCOPE",
        }
    }

    /// Attribute writes are accepted only for server and shared scopes
    pub fn is_writable(&self) -> bool {
        matches!(self, AttributeScope::Server | AttributeScope::Shared)
    }
}

impl fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AttributeScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| Error::malformed(format!("Unknown attribute scope: {}", s)))
    }
}
