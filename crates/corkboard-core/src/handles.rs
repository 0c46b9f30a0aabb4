//! Resize handles for selected entities.

use crate::entities::{MIN_HEIGHT, MIN_WIDTH};
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    /// Edge midpoint (resizes one axis).
    Edge(Edge),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Compute the new frame after dragging a resize handle by `delta`.
///
/// The edge opposite the dragged one stays fixed and the result never drops
/// below the minimum entity size. With `keep_aspect_ratio`, corner drags keep
/// the original width/height ratio.
pub fn apply_resize(bounds: Rect, handle: HandleKind, delta: Vec2, keep_aspect_ratio: bool) -> Rect {
    let (mut x0, mut y0, mut x1, mut y1) = (bounds.x0, bounds.y0, bounds.x1, bounds.y1);

    // Which sides move.
    let (left, top, right, bottom) = match handle {
        HandleKind::Corner(Corner::TopLeft) => (true, true, false, false),
        HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
        HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
        HandleKind::Corner(Corner::BottomRight) => (false, false, true, true),
        HandleKind::Edge(Edge::Top) => (false, true, false, false),
        HandleKind::Edge(Edge::Right) => (false, false, true, false),
        HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
        HandleKind::Edge(Edge::Left) => (true, false, false, false),
    };

    if left {
        x0 = (x0 + delta.x).min(x1 - MIN_WIDTH);
    }
    if right {
        x1 = (x1 + delta.x).max(x0 + MIN_WIDTH);
    }
    if top {
        y0 = (y0 + delta.y).min(y1 - MIN_HEIGHT);
    }
    if bottom {
        y1 = (y1 + delta.y).max(y0 + MIN_HEIGHT);
    }

    if keep_aspect_ratio && matches!(handle, HandleKind::Corner(_)) && bounds.height() > 0.0 {
        let aspect = bounds.width() / bounds.height();
        let mut width = x1 - x0;
        let mut height = y1 - y0;
        // Follow whichever axis grew proportionally more.
        if width / bounds.width() >= height / bounds.height() {
            height = width / aspect;
        } else {
            width = height * aspect;
        }
        if height < MIN_HEIGHT {
            height = MIN_HEIGHT;
            width = height * aspect;
        }
        if width < MIN_WIDTH {
            width = MIN_WIDTH;
            height = width / aspect;
        }
        if left {
            x0 = x1 - width;
        } else {
            x1 = x0 + width;
        }
        if top {
            y0 = y1 - height;
        } else {
            y1 = y0 + height;
        }
    }

    Rect::new(x0, y0, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_resize() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let resized = apply_resize(
            bounds,
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(20.0, 10.0),
            false,
        );
        assert_eq!(resized, Rect::new(0.0, 0.0, 120.0, 60.0));
    }

    #[test]
    fn test_resize_never_below_minimum() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let resized = apply_resize(
            bounds,
            HandleKind::Corner(Corner::TopLeft),
            Vec2::new(500.0, 500.0),
            false,
        );
        assert!(resized.width() >= MIN_WIDTH);
        assert!(resized.height() >= MIN_HEIGHT);
        // Opposite corner stays put.
        assert_eq!(resized.x1, 100.0);
        assert_eq!(resized.y1, 50.0);
    }

    #[test]
    fn test_edge_resize_changes_one_axis() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let resized = apply_resize(bounds, HandleKind::Edge(Edge::Left), Vec2::new(-30.0, 99.0), false);
        assert_eq!(resized, Rect::new(-30.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_aspect_locked_resize() {
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        let resized = apply_resize(
            bounds,
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(200.0, 0.0),
            true,
        );
        assert!((resized.width() - 400.0).abs() < 1e-9);
        assert!((resized.height() - 200.0).abs() < 1e-9);
    }
}
