//! Connector geometry: anchor coordinates, edge routing between two
//! rectangles, and nearest-anchor snapping.
//!
//! Everything here is a pure function of its inputs.

use crate::connector::{Anchor, Connector, End, Endpoint};
use crate::entities::{Entity, EntityId};
use kurbo::{Point, Rect};

/// Default inward margin applied on the destination side of a connector.
pub const CONNECTOR_MARGIN: f64 = 12.0;

/// Coordinates of a named anchor on a rectangle (the edge midpoint).
pub fn anchor_coordinates(rect: Rect, anchor: Anchor) -> Point {
    anchor.point_on(rect)
}

/// The pair of anchors facing each other between two rectangles.
///
/// The connection is horizontal when the centers are further apart on the
/// x axis than on the y axis; ties resolve vertically.
pub fn facing_anchors(from: Rect, to: Rect) -> (Anchor, Anchor) {
    let from_center = from.center();
    let to_center = to.center();
    let dx = to_center.x - from_center.x;
    let dy = to_center.y - from_center.y;

    if dx.abs() > dy.abs() {
        if dx >= 0.0 {
            (Anchor::Right, Anchor::Left)
        } else {
            (Anchor::Left, Anchor::Right)
        }
    } else if dy >= 0.0 {
        (Anchor::Bottom, Anchor::Top)
    } else {
        (Anchor::Top, Anchor::Bottom)
    }
}

/// Resolve the endpoints of a connector between two rectangles using the
/// default margin.
pub fn anchor_for_connection(from: Rect, to: Rect) -> (Point, Point) {
    anchor_for_connection_with_margin(from, to, CONNECTOR_MARGIN)
}

/// Resolve the endpoints of a connector between two rectangles.
///
/// The source point sits on the source's facing edge. The destination point
/// is pushed `margin` units inside the destination's facing edge.
pub fn anchor_for_connection_with_margin(from: Rect, to: Rect, margin: f64) -> (Point, Point) {
    let (from_anchor, to_anchor) = facing_anchors(from, to);
    let start = anchor_coordinates(from, from_anchor);
    let end = inset_toward_center(anchor_coordinates(to, to_anchor), to_anchor, margin);
    (start, end)
}

/// Move an anchor point `margin` units into its rectangle.
fn inset_toward_center(point: Point, anchor: Anchor, margin: f64) -> Point {
    match anchor {
        Anchor::Top => Point::new(point.x, point.y + margin),
        Anchor::Right => Point::new(point.x - margin, point.y),
        Anchor::Bottom => Point::new(point.x, point.y - margin),
        Anchor::Left => Point::new(point.x + margin, point.y),
    }
}

/// Re-derive the cached coordinates of a connector from the current entity
/// rectangles.
///
/// Two attached ends are routed with [`anchor_for_connection_with_margin`].
/// A single attached end resolves to its named anchor while the floating end
/// keeps its stored point. If any referenced entity is missing the result is
/// `[0, 0, 0, 0]`.
pub fn recalc_connector_points(connector: &Connector, entities: &[Entity], margin: f64) -> [f64; 4] {
    let lookup = |id: EntityId| entities.iter().find(|e| e.id() == id).map(Entity::bounds);

    match (connector.from, connector.to) {
        (
            Endpoint::Attached { entity_id: from_id, .. },
            Endpoint::Attached { entity_id: to_id, .. },
        ) => match (lookup(from_id), lookup(to_id)) {
            (Some(from), Some(to)) => {
                let (start, end) = anchor_for_connection_with_margin(from, to, margin);
                [start.x, start.y, end.x, end.y]
            }
            _ => [0.0; 4],
        },
        (Endpoint::Attached { entity_id, anchor }, Endpoint::Floating { point }) => {
            match lookup(entity_id) {
                Some(rect) => {
                    let start = anchor_coordinates(rect, anchor);
                    [start.x, start.y, point.x, point.y]
                }
                None => [0.0; 4],
            }
        }
        (Endpoint::Floating { point }, Endpoint::Attached { entity_id, anchor }) => {
            match lookup(entity_id) {
                Some(rect) => {
                    let end = anchor_coordinates(rect, anchor);
                    [point.x, point.y, end.x, end.y]
                }
                None => [0.0; 4],
            }
        }
        (Endpoint::Floating { point: a }, Endpoint::Floating { point: b }) => [a.x, a.y, b.x, b.y],
    }
}

/// Re-anchor a fully attached connector so its stored anchors match the
/// facing edges. Returns true if an anchor changed.
pub fn reanchor(connector: &mut Connector, entities: &[Entity]) -> bool {
    let (
        Endpoint::Attached { entity_id: from_id, anchor: from_anchor },
        Endpoint::Attached { entity_id: to_id, anchor: to_anchor },
    ) = (connector.from, connector.to)
    else {
        return false;
    };
    let lookup = |id: EntityId| entities.iter().find(|e| e.id() == id).map(Entity::bounds);
    let (Some(from), Some(to)) = (lookup(from_id), lookup(to_id)) else {
        return false;
    };

    let (new_from, new_to) = facing_anchors(from, to);
    if new_from == from_anchor && new_to == to_anchor {
        return false;
    }
    *connector.endpoint_mut(End::From) = Endpoint::attached(from_id, new_from);
    *connector.endpoint_mut(End::To) = Endpoint::attached(to_id, new_to);
    true
}

/// The anchor of `rect` closest to `point`, with its distance.
pub fn nearest_anchor(rect: Rect, point: Point) -> (Anchor, f64) {
    Anchor::ALL
        .iter()
        .map(|&anchor| (anchor, anchor_coordinates(rect, anchor).distance(point)))
        .fold((Anchor::Top, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

/// An anchor found near the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorHit {
    pub entity_id: EntityId,
    pub anchor: Anchor,
    /// Anchor coordinates in canvas space.
    pub point: Point,
    /// Distance from the pointer.
    pub distance: f64,
}

/// Find the anchor closest to `point` within `threshold` across all
/// `entities`, skipping `exclude`.
///
/// Ties on distance prefer the entity with the lowest z-index, then document
/// order.
pub fn find_snap_anchor<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    point: Point,
    threshold: f64,
    exclude: Option<EntityId>,
) -> Option<AnchorHit> {
    let mut best: Option<(AnchorHit, i64)> = None;

    for entity in entities {
        if Some(entity.id()) == exclude {
            continue;
        }
        let bounds = entity.bounds();
        for anchor in Anchor::ALL {
            let anchor_point = anchor_coordinates(bounds, anchor);
            let distance = anchor_point.distance(point);
            if distance > threshold {
                continue;
            }
            let better = match &best {
                None => true,
                Some((hit, z)) => {
                    distance < hit.distance || (distance == hit.distance && entity.z_index < *z)
                }
            };
            if better {
                best = Some((
                    AnchorHit {
                        entity_id: entity.id(),
                        anchor,
                        point: anchor_point,
                        distance,
                    },
                    entity.z_index,
                ));
            }
        }
    }

    best.map(|(hit, _)| hit)
}
