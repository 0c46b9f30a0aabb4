//! Snapshot-based undo/redo.
//!
//! Only document content (entities and connectors) is versioned. Selection,
//! viewport and tool state are deliberately left out.

use crate::connector::Connector;
use crate::entities::Entity;
use serde::{Deserialize, Serialize};

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 20;

/// A deep copy of the versioned document content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub entities: Vec<Entity>,
    pub connectors: Vec<Connector>,
}

/// Bounded past/future stacks of document snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<DocumentSnapshot>,
    redo_stack: Vec<DocumentSnapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }

    /// History keeping at most `limit` undo states (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state about to be changed (call before making changes).
    pub fn snapshot(&mut self, current: DocumentSnapshot) {
        self.undo_stack.push(current);

        // Branching history is not supported.
        self.redo_stack.clear();

        self.trim();
    }

    /// Step back. `current` is the live state, which moves to the redo stack.
    /// Returns the state to restore, or None if there is nothing to undo.
    pub fn undo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Step forward. `current` is the live state, which moves to the undo
    /// stack. Returns the state to restore, or None if there is nothing to redo.
    pub fn redo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        self.trim();
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo states.
    pub fn past_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo states.
    pub fn future_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Oldest retained undo state.
    pub fn oldest(&self) -> Option<&DocumentSnapshot> {
        self.undo_stack.first()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn trim(&mut self) {
        if self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
        }
    }
}
