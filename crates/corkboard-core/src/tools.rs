//! Tool system for the board.

use crate::entities::EntityKind;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Sticky,
    Text,
    Rect,
    Image,
    /// Connector tool; owns the connection-mode workflow.
    Line,
}

impl ToolKind {
    /// The entity kind a placement tool creates.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            ToolKind::Sticky => Some(EntityKind::Sticky),
            ToolKind::Text => Some(EntityKind::Text),
            ToolKind::Rect => Some(EntityKind::Rect),
            ToolKind::Image => Some(EntityKind::Image),
            ToolKind::Select | ToolKind::Pan | ToolKind::Line => None,
        }
    }

    /// Whether this tool drives connector creation.
    pub fn is_connect(self) -> bool {
        self == ToolKind::Line
    }
}
