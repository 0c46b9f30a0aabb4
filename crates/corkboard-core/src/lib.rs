//! Corkboard Core Library
//!
//! Platform-agnostic document and state engine for the Corkboard
//! diagramming surface: entities, connectors, undo history, connection
//! gestures, hover proximity and persistence.

pub mod board;
pub mod config;
pub mod connection;
pub mod connector;
pub mod entities;
pub mod geometry;
pub mod handles;
pub mod history;
pub mod proximity;
pub mod selection;
pub mod sizing;
pub mod snap;
pub mod snapshot;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use board::{Board, BoardEvent};
pub use config::{BoardConfig, ConfigError};
pub use connection::{ClickTarget, ConnectionMode, ConnectionOutcome, EndpointDrag};
pub use connector::{Anchor, Connector, ConnectorId, ConnectorPatch, ConnectorSpec, ConnectorStyle, End, Endpoint};
pub use entities::{Entity, EntityBody, EntityId, EntityKind, EntityPatch, Placement};
pub use geometry::{CONNECTOR_MARGIN, anchor_coordinates, anchor_for_connection, recalc_connector_points};
pub use handles::{Corner, Edge, HandleKind};
pub use history::{DocumentSnapshot, History, MAX_UNDO_HISTORY};
pub use proximity::{HoverBufferConfig, ProximityLevel, ProximityThresholds};
pub use selection::Selection;
pub use sizing::{DefaultSizer, SizeProvider};
pub use snap::{SnapResult, align_rect};
pub use snapshot::{BoardData, SnapshotError};
pub use tools::ToolKind;
pub use viewport::{Viewport, ViewportPatch};
