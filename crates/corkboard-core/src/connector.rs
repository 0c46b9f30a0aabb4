//! Connectors: edges between entity anchors or floating canvas points.

use crate::entities::{EntityId, SerializableColor, now_millis};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for connectors.
pub type ConnectorId = Uuid;

/// One of the four edge midpoints of an entity's bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left];

    /// The anchor on the opposite edge.
    pub fn opposite(self) -> Self {
        match self {
            Anchor::Top => Anchor::Bottom,
            Anchor::Right => Anchor::Left,
            Anchor::Bottom => Anchor::Top,
            Anchor::Left => Anchor::Right,
        }
    }

    /// Midpoint of the corresponding edge of `rect`.
    pub fn point_on(self, rect: Rect) -> Point {
        let center = rect.center();
        match self {
            Anchor::Top => Point::new(center.x, rect.y0),
            Anchor::Right => Point::new(rect.x1, center.y),
            Anchor::Bottom => Point::new(center.x, rect.y1),
            Anchor::Left => Point::new(rect.x0, center.y),
        }
    }
}

/// Which end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum End {
    From,
    To,
}

impl End {
    pub fn other(self) -> Self {
        match self {
            End::From => End::To,
            End::To => End::From,
        }
    }
}

/// One end of a connector.
///
/// An attached end always names both the entity and the anchor, so a
/// connector can never reference an entity without knowing where on it the
/// edge lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    Attached {
        #[serde(rename = "entityId")]
        entity_id: EntityId,
        anchor: Anchor,
    },
    Floating {
        point: Point,
    },
}

impl Endpoint {
    pub fn attached(entity_id: EntityId, anchor: Anchor) -> Self {
        Endpoint::Attached { entity_id, anchor }
    }

    pub fn floating(x: f64, y: f64) -> Self {
        Endpoint::Floating {
            point: Point::new(x, y),
        }
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Endpoint::Attached { entity_id, .. } => Some(*entity_id),
            Endpoint::Floating { .. } => None,
        }
    }

    pub fn anchor(&self) -> Option<Anchor> {
        match self {
            Endpoint::Attached { anchor, .. } => Some(*anchor),
            Endpoint::Floating { .. } => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, Endpoint::Attached { .. })
    }

    pub fn references(&self, id: EntityId) -> bool {
        self.entity_id() == Some(id)
    }
}

/// Stroke of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorStyle {
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    /// Draw an arrowhead at the `to` end.
    #[serde(default = "default_arrowhead")]
    pub arrowhead: bool,
}

fn default_arrowhead() -> bool {
    true
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self {
            stroke: SerializableColor::new(60, 60, 60, 255),
            stroke_width: 2.0,
            arrowhead: true,
        }
    }
}

/// An edge between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub(crate) id: ConnectorId,
    pub from: Endpoint,
    pub to: Endpoint,
    /// Cached resolved coordinates `[x1, y1, x2, y2]`.
    pub points: [f64; 4],
    pub z_index: i64,
    #[serde(default)]
    pub style: ConnectorStyle,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Connector {
    /// Create a connector. Points start at the floating coordinates (or zero
    /// for attached ends) until the board resolves them.
    pub fn new(spec: ConnectorSpec, z_index: i64) -> Self {
        let now = now_millis();
        let mut connector = Self {
            id: Uuid::new_v4(),
            from: spec.from,
            to: spec.to,
            points: [0.0; 4],
            z_index,
            style: spec.style.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        if let Endpoint::Floating { point } = connector.from {
            connector.set_point(End::From, point);
        }
        if let Endpoint::Floating { point } = connector.to {
            connector.set_point(End::To, point);
        }
        connector
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn endpoint(&self, end: End) -> &Endpoint {
        match end {
            End::From => &self.from,
            End::To => &self.to,
        }
    }

    pub fn endpoint_mut(&mut self, end: End) -> &mut Endpoint {
        match end {
            End::From => &mut self.from,
            End::To => &mut self.to,
        }
    }

    pub fn from_id(&self) -> Option<EntityId> {
        self.from.entity_id()
    }

    pub fn to_id(&self) -> Option<EntityId> {
        self.to.entity_id()
    }

    pub fn from_anchor(&self) -> Option<Anchor> {
        self.from.anchor()
    }

    pub fn to_anchor(&self) -> Option<Anchor> {
        self.to.anchor()
    }

    /// Whether either end is attached to `id`.
    pub fn references(&self, id: EntityId) -> bool {
        self.from.references(id) || self.to.references(id)
    }

    /// Whether at least one end is attached.
    pub fn has_attachment(&self) -> bool {
        self.from.is_attached() || self.to.is_attached()
    }

    /// Whether both ends are attached to the same entity.
    pub fn is_self_connection(&self) -> bool {
        matches!(
            (self.from.entity_id(), self.to.entity_id()),
            (Some(a), Some(b)) if a == b
        )
    }

    /// Resolved coordinate of one end.
    pub fn point(&self, end: End) -> Point {
        match end {
            End::From => Point::new(self.points[0], self.points[1]),
            End::To => Point::new(self.points[2], self.points[3]),
        }
    }

    pub(crate) fn set_point(&mut self, end: End, point: Point) {
        match end {
            End::From => {
                self.points[0] = point.x;
                self.points[1] = point.y;
            }
            End::To => {
                self.points[2] = point.x;
                self.points[3] = point.y;
            }
        }
    }

    /// Apply a partial update. Returns true if anything changed.
    pub fn apply(&mut self, patch: &ConnectorPatch) -> bool {
        let mut changed = false;
        if let Some(from) = patch.from {
            if from != self.from {
                self.from = from;
                if let Endpoint::Floating { point } = from {
                    self.set_point(End::From, point);
                }
                changed = true;
            }
        }
        if let Some(to) = patch.to {
            if to != self.to {
                self.to = to;
                if let Endpoint::Floating { point } = to {
                    self.set_point(End::To, point);
                }
                changed = true;
            }
        }
        if let Some(style) = patch.style {
            if style != self.style {
                self.style = style;
                changed = true;
            }
        }
        if changed {
            self.updated_at = now_millis();
        }
        changed
    }
}

/// Description of a connector to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorSpec {
    pub from: Endpoint,
    pub to: Endpoint,
    pub style: Option<ConnectorStyle>,
}

impl ConnectorSpec {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self {
            from,
            to,
            style: None,
        }
    }

    /// Both ends attached.
    pub fn between(from: EntityId, from_anchor: Anchor, to: EntityId, to_anchor: Anchor) -> Self {
        Self::new(
            Endpoint::attached(from, from_anchor),
            Endpoint::attached(to, to_anchor),
        )
    }

    /// Source attached, destination floating.
    pub fn dangling(from: EntityId, from_anchor: Anchor, to: Point) -> Self {
        Self::new(
            Endpoint::attached(from, from_anchor),
            Endpoint::Floating { point: to },
        )
    }

    pub fn with_style(mut self, style: ConnectorStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn is_self_connection(&self) -> bool {
        matches!(
            (self.from.entity_id(), self.to.entity_id()),
            (Some(a), Some(b)) if a == b
        )
    }
}

/// Sparse update for a connector. Used to reattach or detach ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectorPatch {
    pub from: Option<Endpoint>,
    pub to: Option<Endpoint>,
    pub style: Option<ConnectorStyle>,
}

impl ConnectorPatch {
    /// Replace a single end.
    pub fn endpoint(end: End, endpoint: Endpoint) -> Self {
        match end {
            End::From => Self {
                from: Some(endpoint),
                ..Self::default()
            },
            End::To => Self {
                to: Some(endpoint),
                ..Self::default()
            },
        }
    }
}
