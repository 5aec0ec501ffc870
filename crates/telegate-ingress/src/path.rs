//! Request routing
//!
//! Turns the path segments below the telemetry base path into one of a closed
//! set of [`TelemetryCommand`]s. Each verb has its own parser, and each path
//! arity its own match arm, so that the meaning of a shape is never inferred
//! from a chain of conditionals.

use crate::params::QueryParams;
use telegate_core::{AttributeScope, EntityId, Error, Feature, Result};

/// Listing method of a read path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMethod {
    Keys,
    Values,
}

impl std::str::FromStr for ReadMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keys" => Ok(ReadMethod::Keys),
            "values" => Ok(ReadMethod::Values),
            other => Err(Error::malformed(format!("Unknown read method: {other}"))),
        }
    }
}

/// A fully routed telemetry request
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryCommand {
    /// `GET .../{type}/{id}/keys/{feature}[/{scope}]`
    KeysRead {
        entity: EntityId,
        feature: Feature,
        scope: Option<AttributeScope>,
    },
    /// `GET .../{type}/{id}/values/{feature}[/{scope}]`
    ValuesRead {
        entity: EntityId,
        feature: Feature,
        scope: Option<AttributeScope>,
        keys: Option<Vec<String>>,
    },
    AttributesWrite {
        entity: EntityId,
        scope: AttributeScope,
    },
    TimeseriesWrite {
        entity: EntityId,
        ttl_secs: u64,
    },
    /// `keys` is `None` when the caller supplied no keys to remove
    AttributesDelete {
        entity: EntityId,
        scope: AttributeScope,
        keys: Option<Vec<String>>,
    },
}

impl TelemetryCommand {
    pub fn entity(&self) -> &EntityId {
        match self {
            TelemetryCommand::KeysRead { entity, .. }
            | TelemetryCommand::ValuesRead { entity, .. }
            | TelemetryCommand::AttributesWrite { entity, .. }
            | TelemetryCommand::TimeseriesWrite { entity, .. }
            | TelemetryCommand::AttributesDelete { entity, .. } => entity,
        }
    }

    pub fn feature(&self) -> Feature {
        match self {
            TelemetryCommand::KeysRead { feature, .. }
            | TelemetryCommand::ValuesRead { feature, .. } => *feature,
            TelemetryCommand::TimeseriesWrite { .. } => Feature::Timeseries,
            TelemetryCommand::AttributesWrite { .. } | TelemetryCommand::AttributesDelete { .. } => {
                Feature::Attributes
            }
        }
    }
}

/// Split a request path into segments.
///
/// Interior empty segments are kept so that `a//b` still fails on its empty
/// token; trailing empty segments from a final `/` are dropped.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

/// Route a GET path of shape `[entityType, entityId, method, feature, scope?]`.
///
/// Segments past the scope are ignored. The scope is only interpreted for
/// attribute reads; a blank scope means every namespace.
pub fn parse_read_path(segments: &[String], params: &QueryParams) -> Result<TelemetryCommand> {
    let [entity_type, entity_id, method, feature, rest @ ..] = segments else {
        return Err(Error::malformed(format!(
            "Read path needs at least 4 segments, got {}",
            segments.len()
        )));
    };
    require_non_empty(&[entity_type, entity_id, method, feature])?;

    let entity = EntityId::from_parts(entity_type, entity_id)?;
    let method: ReadMethod = method.parse()?;
    let feature: Feature = feature.parse()?;
    let scope = match (feature, rest.first().map(String::as_str)) {
        (Feature::Attributes, Some(token)) if !token.is_empty() => Some(token.parse()?),
        _ => None,
    };

    Ok(match method {
        ReadMethod::Keys => TelemetryCommand::KeysRead {
            entity,
            feature,
            scope,
        },
        ReadMethod::Values => TelemetryCommand::ValuesRead {
            entity,
            feature,
            scope,
            keys: params.keys(),
        },
    })
}

/// Route a POST path. The arity selects the shape:
///
/// | arity | shape |
/// |---|---|
/// | 2 | `[deviceId, scope]` |
/// | 3 | `[entityType, entityId, scope]` |
/// | 4 | `[entityType, entityId, feature, scope]` |
/// | 5 | `[entityType, entityId, feature, scope, ttl]` |
///
/// Arities 2 and 3 always write attributes. A series write ignores its scope.
pub fn parse_write_path(segments: &[String]) -> Result<TelemetryCommand> {
    match segments {
        [device_id, scope] => attributes_write(EntityId::device(device_id)?, scope),
        [entity_type, entity_id, scope] => {
            attributes_write(EntityId::from_parts(entity_type, entity_id)?, scope)
        }
        [entity_type, entity_id, feature, scope] => {
            let entity = EntityId::from_parts(entity_type, entity_id)?;
            match feature.parse::<Feature>()? {
                Feature::Attributes => attributes_write(entity, scope),
                Feature::Timeseries => Ok(TelemetryCommand::TimeseriesWrite { entity, ttl_secs: 0 }),
            }
        }
        [entity_type, entity_id, feature, scope, ttl] => {
            let entity = EntityId::from_parts(entity_type, entity_id)?;
            match feature.parse::<Feature>()? {
                Feature::Attributes => attributes_write(entity, scope),
                Feature::Timeseries => Ok(TelemetryCommand::TimeseriesWrite {
                    entity,
                    ttl_secs: parse_ttl(ttl)?,
                }),
            }
        }
        _ => Err(Error::malformed(format!(
            "Unsupported write path arity: {}",
            segments.len()
        ))),
    }
}

/// Route a DELETE path: `[deviceId, scope]` or `[entityType, entityId, scope]`.
///
/// Every namespace is deletable, including the client one that cannot be
/// written.
pub fn parse_delete_path(segments: &[String], params: &QueryParams) -> Result<TelemetryCommand> {
    let (entity, scope) = match segments {
        [device_id, scope] => (EntityId::device(device_id)?, scope),
        [entity_type, entity_id, scope] => (EntityId::from_parts(entity_type, entity_id)?, scope),
        _ => {
            return Err(Error::malformed(format!(
                "Unsupported delete path arity: {}",
                segments.len()
            )));
        }
    };

    Ok(TelemetryCommand::AttributesDelete {
        entity,
        scope: scope.parse()?,
        keys: params.keys(),
    })
}

fn attributes_write(entity: EntityId, scope: &str) -> Result<TelemetryCommand> {
    let scope: AttributeScope = scope.parse()?;
    if !scope.is_writable() {
        return Err(Error::malformed(format!("Attributes in {scope} can't be written")));
    }
    Ok(TelemetryCommand::AttributesWrite { entity, scope })
}

fn parse_ttl(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::malformed(format!("Invalid ttl: {raw}")))
}

fn require_non_empty(segments: &[&String]) -> Result<()> {
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::malformed("Read path contains an empty segment"));
    }
    Ok(())
}
