//! Selection state: selected entities and connectors.
//!
//! Selection is view state. It never enters undo history.

use crate::connector::ConnectorId;
use crate::entities::EntityId;

/// Selected ids, kept in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entities: Vec<EntityId>,
    connectors: Vec<ConnectorId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connectors
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.connectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len() + self.connectors.len()
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    pub fn contains_connector(&self, id: ConnectorId) -> bool {
        self.connectors.contains(&id)
    }

    /// Add an entity to the selection.
    pub fn add_entity(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
    }

    /// Add a connector to the selection.
    pub fn add_connector(&mut self, id: ConnectorId) {
        if !self.connectors.contains(&id) {
            self.connectors.push(id);
        }
    }

    /// Flip an entity's membership. Returns whether it is now selected.
    pub fn toggle_entity(&mut self, id: EntityId) -> bool {
        if let Some(pos) = self.entities.iter().position(|&e| e == id) {
            self.entities.remove(pos);
            false
        } else {
            self.entities.push(id);
            true
        }
    }

    /// Flip a connector's membership. Returns whether it is now selected.
    pub fn toggle_connector(&mut self, id: ConnectorId) -> bool {
        if let Some(pos) = self.connectors.iter().position(|&c| c == id) {
            self.connectors.remove(pos);
            false
        } else {
            self.connectors.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.connectors.clear();
    }

    /// Drop ids that no longer exist. Returns true if anything was removed.
    pub fn retain(
        &mut self,
        mut keep_entity: impl FnMut(EntityId) -> bool,
        mut keep_connector: impl FnMut(ConnectorId) -> bool,
    ) -> bool {
        let before = self.len();
        self.entities.retain(|&id| keep_entity(id));
        self.connectors.retain(|&id| keep_connector(id));
        self.len() != before
    }
}
