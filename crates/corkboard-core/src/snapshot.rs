//! Import/export payload for a board document.

use crate::connector::{Connector, ConnectorId};
use crate::entities::{Entity, EntityId, now_millis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Schema version written by this crate and the only one it accepts.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that reject an import. The board is left untouched.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid board JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unsupported board version {found} (expected {expected})")]
    VersionMismatch { found: String, expected: u32 },
    #[error("duplicate id {0}")]
    DuplicateId(uuid::Uuid),
    #[error("connector {connector} references missing entity {entity}")]
    DanglingReference { connector: ConnectorId, entity: EntityId },
    #[error("connector {0} has both ends attached to the same entity")]
    SelfConnection(ConnectorId),
}

/// Serialized document: entities, connectors and a version tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardData {
    #[serde(alias = "entities")]
    pub elements: Vec<Entity>,
    pub connectors: Vec<Connector>,
    pub version: u32,
    #[serde(default)]
    pub saved_at: u64,
}

impl Default for BoardData {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            connectors: Vec::new(),
            version: SCHEMA_VERSION,
            saved_at: 0,
        }
    }
}

impl BoardData {
    /// Build a payload stamped with the current time.
    pub fn new(elements: Vec<Entity>, connectors: Vec<Connector>) -> Self {
        Self {
            elements,
            connectors,
            version: SCHEMA_VERSION,
            saved_at: now_millis(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.connectors.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate a payload.
    ///
    /// Required top-level fields are checked before deserializing so a
    /// missing array or version is reported by name.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate and deserialize an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(map) = &value else {
            return Err(SnapshotError::MissingField("elements"));
        };
        if !map.contains_key("elements") && !map.contains_key("entities") {
            return Err(SnapshotError::MissingField("elements"));
        }
        if !map.contains_key("connectors") {
            return Err(SnapshotError::MissingField("connectors"));
        }
        let version = map
            .get("version")
            .ok_or(SnapshotError::MissingField("version"))?;
        if version.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
            return Err(SnapshotError::VersionMismatch {
                found: version.to_string(),
                expected: SCHEMA_VERSION,
            });
        }

        let data: Self = serde_json::from_value(value)?;
        data.validate()?;
        Ok(data)
    }

    /// Check structural integrity: unique ids and no attached end pointing
    /// at an absent entity.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SCHEMA_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: self.version.to_string(),
                expected: SCHEMA_VERSION,
            });
        }

        let mut ids = HashSet::with_capacity(self.elements.len() + self.connectors.len());
        for entity in &self.elements {
            if !ids.insert(entity.id()) {
                return Err(SnapshotError::DuplicateId(entity.id()));
            }
        }
        let entity_ids = ids.clone();
        for connector in &self.connectors {
            if !ids.insert(connector.id()) {
                return Err(SnapshotError::DuplicateId(connector.id()));
            }
            if connector.is_self_connection() {
                return Err(SnapshotError::SelfConnection(connector.id()));
            }
            for entity in [connector.from_id(), connector.to_id()].into_iter().flatten() {
                if !entity_ids.contains(&entity) {
                    return Err(SnapshotError::DanglingReference {
                        connector: connector.id(),
                        entity,
                    });
                }
            }
        }
        Ok(())
    }
}
