//! Drag-time alignment: snapping a dragged rectangle to guide lines derived
//! from its siblings and the canvas.

use kurbo::{Point, Rect};

/// Distance (in canvas units) within which an edge or center snaps to a guide.
pub const ALIGNMENT_TOLERANCE: f64 = 5.0;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideAxis {
    /// A vertical line at a fixed x. Constrains horizontal movement.
    Vertical,
    /// A horizontal line at a fixed y. Constrains vertical movement.
    Horizontal,
}

/// Which feature of a rectangle a guide (or a dragged edge) corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideFeature {
    /// Left or top edge.
    Start,
    Center,
    /// Right or bottom edge.
    End,
}

/// Where a guide came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideSource {
    /// A sibling rectangle, by index in the slice passed to [`collect_guides`].
    Sibling(usize),
    /// The canvas bounds (edges and center).
    Canvas,
}

/// A candidate alignment line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: GuideAxis,
    /// x for vertical guides, y for horizontal guides.
    pub position: f64,
    pub feature: GuideFeature,
    pub source: GuideSource,
}

/// Result of aligning a dragged rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Snapped top-left position of the dragged rectangle.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
    /// Guides that fired, for rendering feedback.
    pub guides: Vec<Guide>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

fn push_rect_guides(guides: &mut Vec<Guide>, rect: Rect, source: GuideSource) {
    let center = rect.center();
    for (axis, values) in [
        (GuideAxis::Vertical, [rect.x0, center.x, rect.x1]),
        (GuideAxis::Horizontal, [rect.y0, center.y, rect.y1]),
    ] {
        for (position, feature) in values
            .into_iter()
            .zip([GuideFeature::Start, GuideFeature::Center, GuideFeature::End])
        {
            guides.push(Guide {
                axis,
                position,
                feature,
                source,
            });
        }
    }
}

/// Build guide lines from sibling rectangles and, optionally, the canvas.
///
/// The dragged rectangle must not be among `siblings`.
pub fn collect_guides(siblings: &[Rect], canvas: Option<Rect>) -> Vec<Guide> {
    let mut guides = Vec::with_capacity((siblings.len() + 1) * 6);
    for (index, rect) in siblings.iter().enumerate() {
        push_rect_guides(&mut guides, *rect, GuideSource::Sibling(index));
    }
    if let Some(canvas) = canvas {
        push_rect_guides(&mut guides, canvas, GuideSource::Canvas);
    }
    guides
}

/// Best snap on one axis: (offset to apply, guide).
fn best_on_axis(edges: [f64; 3], guides: &[Guide], axis: GuideAxis, tolerance: f64) -> Option<(f64, Guide)> {
    let mut best: Option<(f64, Guide)> = None;
    for guide in guides.iter().filter(|g| g.axis == axis) {
        for edge in edges {
            let offset = guide.position - edge;
            if offset.abs() > tolerance {
                continue;
            }
            if best.is_none_or(|(current, _)| offset.abs() < current.abs()) {
                best = Some((offset, *guide));
            }
        }
    }
    best
}

/// Snap a dragged rectangle to the nearest guides.
///
/// Each axis is decided independently: the dragged rectangle's left, center
/// and right are compared with vertical guides, its top, middle and bottom
/// with horizontal guides. The closest match within `tolerance` moves that
/// axis so the two coincide exactly.
pub fn align_rect(dragged: Rect, guides: &[Guide], tolerance: f64) -> SnapResult {
    let center = dragged.center();
    let mut result = SnapResult::none(Point::new(dragged.x0, dragged.y0));

    if let Some((offset, guide)) = best_on_axis(
        [dragged.x0, center.x, dragged.x1],
        guides,
        GuideAxis::Vertical,
        tolerance,
    ) {
        result.point.x += offset;
        result.snapped_x = true;
        result.guides.push(guide);
    }

    if let Some((offset, guide)) = best_on_axis(
        [dragged.y0, center.y, dragged.y1],
        guides,
        GuideAxis::Horizontal,
        tolerance,
    ) {
        result.point.y += offset;
        result.snapped_y = true;
        result.guides.push(guide);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_guides_counts() {
        let siblings = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 20.0, 30.0, 30.0)];
        assert_eq!(collect_guides(&siblings, None).len(), 12);
        assert_eq!(
            collect_guides(&siblings, Some(Rect::new(0.0, 0.0, 800.0, 600.0))).len(),
            18
        );
    }

    #[test]
    fn test_snaps_left_edge_to_sibling_left_edge() {
        let guides = collect_guides(&[Rect::new(100.0, 0.0, 200.0, 50.0)], None);
        let dragged = Rect::new(103.0, 300.0, 153.0, 340.0);
        let result = align_rect(dragged, &guides, ALIGNMENT_TOLERANCE);
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert!((result.point.x - 100.0).abs() < 1e-9);
        assert!((result.point.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_axes_snap_independently() {
        let guides = collect_guides(&[Rect::new(0.0, 0.0, 100.0, 100.0)], None);
        // Right edge 2 units short of the sibling's right edge, top 4 units below its bottom.
        let dragged = Rect::new(48.0, 104.0, 98.0, 154.0);
        let result = align_rect(dragged, &guides, ALIGNMENT_TOLERANCE);
        assert!(result.snapped_x && result.snapped_y);
        assert!((result.point.x - 50.0).abs() < 1e-9);
        assert!((result.point.y - 100.0).abs() < 1e-9);
        assert_eq!(result.guides.len(), 2);
    }

    #[test]
    fn test_center_snaps_to_canvas_center() {
        let guides = collect_guides(&[], Some(Rect::new(0.0, 0.0, 1000.0, 800.0)));
        let dragged = Rect::new(447.0, 10.0, 547.0, 60.0); // center x 497
        let result = align_rect(dragged, &guides, ALIGNMENT_TOLERANCE);
        assert!(result.snapped_x);
        assert!((result.point.x - 450.0).abs() < 1e-9);
        assert_eq!(result.guides[0].source, GuideSource::Canvas);
        assert_eq!(result.guides[0].feature, GuideFeature::Center);
    }

    #[test]
    fn test_outside_tolerance_does_not_snap() {
        let guides = collect_guides(&[Rect::new(0.0, 0.0, 100.0, 100.0)], None);
        let dragged = Rect::new(220.0, 220.0, 260.0, 260.0);
        let result = align_rect(dragged, &guides, ALIGNMENT_TOLERANCE);
        assert!(!result.is_snapped());
        assert_eq!(result.point, Point::new(220.0, 220.0));
    }

    #[test]
    fn test_closest_guide_wins() {
        let guides = collect_guides(
            &[Rect::new(97.0, 0.0, 150.0, 20.0), Rect::new(101.0, 500.0, 180.0, 520.0)],
            None,
        );
        let dragged = Rect::new(100.0, 300.0, 130.0, 330.0);
        let result = align_rect(dragged, &guides, ALIGNMENT_TOLERANCE);
        assert!((result.point.x - 101.0).abs() < 1e-9);
        assert_eq!(result.guides[0].source, GuideSource::Sibling(1));
    }
}
