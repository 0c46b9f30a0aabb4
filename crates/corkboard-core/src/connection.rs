//! Connector creation workflow and endpoint dragging.
//!
//! The line tool creates connectors in two clicks: the first picks a source
//! anchor, the second picks a destination anchor or an empty canvas point.
//! Existing connectors are re-targeted by dragging one of their ends.

use crate::connector::{Anchor, Connector, ConnectorId, ConnectorSpec, End, Endpoint};
use crate::entities::{Entity, EntityId};
use crate::geometry::{find_snap_anchor, nearest_anchor};
use kurbo::Point;

/// State of the connection workflow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ConnectionMode {
    #[default]
    Idle,
    /// A source anchor has been picked; waiting for the destination.
    SourceSelected { from_id: EntityId, from_anchor: Anchor },
}

/// What a pointer press in connect mode landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickTarget {
    Anchor { entity_id: EntityId, anchor: Anchor },
    /// Empty canvas at a canvas-space point.
    Canvas(Point),
}

/// Result of feeding a click to the workflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionOutcome {
    /// Nothing happened (empty canvas while idle).
    Ignored,
    /// A source anchor was recorded.
    SourceSelected { from_id: EntityId, from_anchor: Anchor },
    /// Create a connector with both ends attached, then return to the
    /// selection tool.
    Connect(ConnectorSpec),
    /// Create a connector whose destination floats on the canvas.
    ConnectFloating(ConnectorSpec),
    /// The pending connection was discarded.
    Cancelled,
}

impl ConnectionOutcome {
    /// The connector to create, if any.
    pub fn spec(&self) -> Option<ConnectorSpec> {
        match self {
            ConnectionOutcome::Connect(spec) | ConnectionOutcome::ConnectFloating(spec) => Some(*spec),
            _ => None,
        }
    }

    /// Whether the tool layer should switch back to the selection tool.
    pub fn reverts_tool(&self) -> bool {
        matches!(self, ConnectionOutcome::Connect(_))
    }
}

impl ConnectionMode {
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionMode::SourceSelected { .. })
    }

    pub fn source(&self) -> Option<(EntityId, Anchor)> {
        match *self {
            ConnectionMode::SourceSelected { from_id, from_anchor } => Some((from_id, from_anchor)),
            ConnectionMode::Idle => None,
        }
    }

    /// Advance the workflow with a click.
    pub fn click(&mut self, target: ClickTarget) -> ConnectionOutcome {
        match (*self, target) {
            (ConnectionMode::Idle, ClickTarget::Anchor { entity_id, anchor }) => {
                *self = ConnectionMode::SourceSelected {
                    from_id: entity_id,
                    from_anchor: anchor,
                };
                ConnectionOutcome::SourceSelected {
                    from_id: entity_id,
                    from_anchor: anchor,
                }
            }
            (ConnectionMode::Idle, ClickTarget::Canvas(_)) => ConnectionOutcome::Ignored,
            (ConnectionMode::SourceSelected { from_id, .. }, ClickTarget::Anchor { entity_id, .. })
                if entity_id == from_id =>
            {
                log::debug!("Discarding self-connection on entity {from_id}");
                *self = ConnectionMode::Idle;
                ConnectionOutcome::Cancelled
            }
            (
                ConnectionMode::SourceSelected { from_id, from_anchor },
                ClickTarget::Anchor { entity_id, anchor },
            ) => {
                *self = ConnectionMode::Idle;
                ConnectionOutcome::Connect(ConnectorSpec::between(from_id, from_anchor, entity_id, anchor))
            }
            (ConnectionMode::SourceSelected { from_id, from_anchor }, ClickTarget::Canvas(point)) => {
                *self = ConnectionMode::Idle;
                ConnectionOutcome::ConnectFloating(ConnectorSpec::dangling(from_id, from_anchor, point))
            }
        }
    }

    /// Abort a pending connection. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        *self = ConnectionMode::Idle;
        was_active
    }
}

/// Canvas-space snap radius for a screen-space threshold at `zoom`.
pub fn snap_radius(threshold: f64, zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > 0.0 {
        threshold / zoom
    } else {
        threshold
    }
}

/// Resolve a pointer position into a click target.
///
/// An anchor within `radius` wins. Otherwise a point inside an entity picks
/// the topmost entity's nearest anchor. Anything else is empty canvas.
pub fn resolve_click(entities: &[Entity], point: Point, radius: f64) -> ClickTarget {
    if let Some(hit) = find_snap_anchor(entities, point, radius, None) {
        return ClickTarget::Anchor {
            entity_id: hit.entity_id,
            anchor: hit.anchor,
        };
    }

    // Later entries paint above earlier ones at equal z.
    let topmost = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.bounds().contains(point))
        .max_by_key(|(index, e)| (e.z_index, *index))
        .map(|(_, e)| e);

    match topmost {
        Some(entity) => ClickTarget::Anchor {
            entity_id: entity.id(),
            anchor: nearest_anchor(entity.bounds(), point).0,
        },
        None => ClickTarget::Canvas(point),
    }
}

/// An in-progress drag of one connector end.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDrag {
    pub connector_id: ConnectorId,
    pub end: End,
    /// The endpoint before the drag started.
    pub original: Endpoint,
    /// Entity attached at the other end, which this end may not join.
    pub other_entity: Option<EntityId>,
    /// Latest pointer position in canvas space.
    pub current: Point,
}

impl EndpointDrag {
    pub fn new(connector: &Connector, end: End, pointer: Point) -> Self {
        Self {
            connector_id: connector.id(),
            end,
            original: *connector.endpoint(end),
            other_entity: connector.endpoint(end.other()).entity_id(),
            current: pointer,
        }
    }

    pub fn update(&mut self, pointer: Point) {
        self.current = pointer;
    }

    /// The endpoint produced by releasing at `release`.
    ///
    /// Attaches to the nearest anchor within `radius`, ignoring the entity at
    /// the other end. With no such anchor the end floats at the release point.
    pub fn resolve(&self, entities: &[Entity], release: Point, radius: f64) -> Endpoint {
        match find_snap_anchor(entities, release, radius, self.other_entity) {
            Some(hit) => Endpoint::attached(hit.entity_id, hit.anchor),
            None => {
                log::debug!(
                    "Connector {} end {:?} left floating at {release:?}",
                    self.connector_id,
                    self.end
                );
                Endpoint::Floating { point: release }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use kurbo::Size;
    use uuid::Uuid;

    fn entity(x: f64, y: f64, z: i64) -> Entity {
        Entity::new(EntityKind::Rect.into(), Point::new(x, y), Size::new(100.0, 100.0), z)
    }

    #[test]
    fn test_two_click_connection() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut mode = ConnectionMode::default();

        let first = mode.click(ClickTarget::Anchor { entity_id: a, anchor: Anchor::Right });
        assert!(matches!(first, ConnectionOutcome::SourceSelected { .. }));
        assert!(mode.is_active());

        let second = mode.click(ClickTarget::Anchor { entity_id: b, anchor: Anchor::Left });
        assert_eq!(
            second,
            ConnectionOutcome::Connect(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
        );
        assert!(second.reverts_tool());
        assert_eq!(mode, ConnectionMode::Idle);
    }

    #[test]
    fn test_canvas_click_creates_partial_connector() {
        let a = Uuid::new_v4();
        let mut mode = ConnectionMode::SourceSelected { from_id: a, from_anchor: Anchor::Bottom };
        let outcome = mode.click(ClickTarget::Canvas(Point::new(40.0, 400.0)));
        let spec = outcome.spec().unwrap();
        assert_eq!(spec.from, Endpoint::attached(a, Anchor::Bottom));
        assert_eq!(spec.to, Endpoint::floating(40.0, 400.0));
        assert!(!outcome.reverts_tool());
        assert_eq!(mode, ConnectionMode::Idle);
    }

    #[test]
    fn test_same_entity_cancels() {
        let a = Uuid::new_v4();
        let mut mode = ConnectionMode::default();
        mode.click(ClickTarget::Anchor { entity_id: a, anchor: Anchor::Top });
        for anchor in Anchor::ALL {
            let mut pending = mode;
            let outcome = pending.click(ClickTarget::Anchor { entity_id: a, anchor });
            assert_eq!(outcome, ConnectionOutcome::Cancelled);
            assert!(outcome.spec().is_none());
            assert_eq!(pending, ConnectionMode::Idle);
        }
    }

    #[test]
    fn test_idle_canvas_click_is_ignored() {
        let mut mode = ConnectionMode::default();
        assert_eq!(mode.click(ClickTarget::Canvas(Point::ZERO)), ConnectionOutcome::Ignored);
        assert!(!mode.cancel());
    }

    #[test]
    fn test_cancel() {
        let mut mode = ConnectionMode::SourceSelected {
            from_id: Uuid::new_v4(),
            from_anchor: Anchor::Left,
        };
        assert!(mode.cancel());
        assert_eq!(mode, ConnectionMode::Idle);
    }

    #[test]
    fn test_snap_radius_scales_with_zoom() {
        assert!((snap_radius(40.0, 2.0) - 20.0).abs() < 1e-9);
        assert!((snap_radius(40.0, 0.5) - 80.0).abs() < 1e-9);
        assert!((snap_radius(40.0, 0.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_click() {
        let low = entity(0.0, 0.0, 0);
        let high = entity(50.0, 50.0, 3);
        let entities = vec![low.clone(), high.clone()];

        // Near high's right anchor (150, 100).
        assert_eq!(
            resolve_click(&entities, Point::new(148.0, 101.0), 10.0),
            ClickTarget::Anchor { entity_id: high.id(), anchor: Anchor::Right }
        );
        // low's bottom anchor and high's left anchor coincide; lower z wins.
        assert_eq!(
            resolve_click(&entities, Point::new(52.0, 101.0), 10.0),
            ClickTarget::Anchor { entity_id: low.id(), anchor: Anchor::Bottom }
        );
        // Deep inside the overlap: topmost entity, nearest anchor.
        assert_eq!(
            resolve_click(&entities, Point::new(80.0, 70.0), 5.0),
            ClickTarget::Anchor { entity_id: high.id(), anchor: Anchor::Top }
        );
        assert_eq!(
            resolve_click(&entities, Point::new(900.0, 900.0), 10.0),
            ClickTarget::Canvas(Point::new(900.0, 900.0))
        );
    }

    #[test]
    fn test_endpoint_drag_attach_and_detach() {
        let a = entity(0.0, 0.0, 0);
        let b = entity(300.0, 0.0, 1);
        let c = entity(0.0, 300.0, 2);
        let connector = Connector::new(
            ConnectorSpec::between(a.id(), Anchor::Right, b.id(), Anchor::Left),
            3,
        );
        let entities = vec![a.clone(), b, c.clone()];

        let drag = EndpointDrag::new(&connector, End::To, Point::new(300.0, 50.0));
        assert_eq!(drag.other_entity, Some(a.id()));

        // Release next to c's top anchor (50, 300).
        assert_eq!(
            drag.resolve(&entities, Point::new(55.0, 290.0), 40.0),
            Endpoint::attached(c.id(), Anchor::Top)
        );
        // Release on empty canvas.
        assert_eq!(
            drag.resolve(&entities, Point::new(800.0, 800.0), 40.0),
            Endpoint::floating(800.0, 800.0)
        );
        // Release on the source entity's own anchor floats instead.
        assert_eq!(
            drag.resolve(&entities, Point::new(50.0, 102.0), 40.0),
            Endpoint::floating(50.0, 102.0)
        );
    }

    #[test]
    fn test_endpoint_drag_skips_other_end_entity() {
        let a = entity(0.0, 0.0, 0);
        let b = entity(300.0, 0.0, 1);
        let c = entity(0.0, 130.0, 2);
        let connector = Connector::new(
            ConnectorSpec::between(a.id(), Anchor::Right, b.id(), Anchor::Left),
            3,
        );
        let entities = vec![a, b, c.clone()];
        let drag = EndpointDrag::new(&connector, End::To, Point::new(300.0, 50.0));

        // 12 units from a's bottom anchor, 18 from c's top anchor.
        assert_eq!(
            drag.resolve(&entities, Point::new(50.0, 112.0), 40.0),
            Endpoint::attached(c.id(), Anchor::Top)
        );
    }
}
