//! Viewport: pan/zoom of the infinite canvas.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default minimum zoom.
pub const MIN_ZOOM: f64 = 0.05;
/// Default maximum zoom.
pub const MAX_ZOOM: f64 = 5.0;

/// Screen-space translation applied before scale:
/// `screen = canvas * zoom + (pan_x, pan_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    #[serde(skip, default = "default_min_zoom")]
    min_zoom: f64,
    #[serde(skip, default = "default_max_zoom")]
    max_zoom: f64,
}

fn default_min_zoom() -> f64 {
    MIN_ZOOM
}

fn default_max_zoom() -> f64 {
    MAX_ZOOM
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_limits(MIN_ZOOM, MAX_ZOOM)
    }
}

/// Partial viewport update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportPatch {
    pub zoom: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
}

impl ViewportPatch {
    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    pub fn pan(pan_x: f64, pan_y: f64) -> Self {
        Self {
            pan_x: Some(pan_x),
            pan_y: Some(pan_y),
            ..Self::default()
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport at zoom 1 with custom zoom limits.
    pub fn with_limits(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            zoom: 1.0_f64.clamp(min_zoom, max_zoom.max(min_zoom)),
            pan_x: 0.0,
            pan_y: 0.0,
            min_zoom,
            max_zoom: max_zoom.max(min_zoom),
        }
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Clamp a zoom value into the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.zoom
        }
    }

    /// Apply a partial update. Returns true if anything changed.
    pub fn apply(&mut self, patch: ViewportPatch) -> bool {
        let before = *self;
        if let Some(zoom) = patch.zoom {
            self.zoom = self.clamp_zoom(zoom);
        }
        if let Some(pan_x) = patch.pan_x.filter(|v| v.is_finite()) {
            self.pan_x = pan_x;
        }
        if let Some(pan_y) = patch.pan_y.filter(|v| v.is_finite()) {
            self.pan_y = pan_y;
        }
        *self != before
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.pan_x, self.pan_y)
    }

    /// Canvas-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.zoom)
    }

    /// Screen-to-canvas transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset())
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Convert a screen-space length into canvas units.
    pub fn screen_to_canvas_len(&self, length: f64) -> f64 {
        length / self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.pan_x += delta.x;
        self.pan_y += delta.y;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let canvas_point = self.screen_to_canvas(screen_point);
        self.zoom = new_zoom;

        // Keep canvas_point under screen_point.
        let new_screen = self.canvas_to_screen(canvas_point);
        self.pan_x += screen_point.x - new_screen.x;
        self.pan_y += screen_point.y - new_screen.y;
    }

    /// Reset to zoom 1 without pan.
    pub fn reset(&mut self) {
        self.zoom = self.clamp_zoom(1.0);
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Canvas-space rectangle visible in a screen of `screen` size.
    pub fn visible_rect(&self, screen: Size) -> Rect {
        let top_left = self.screen_to_canvas(Point::ZERO);
        let bottom_right = self.screen_to_canvas(Point::new(screen.width, screen.height));
        Rect::from_points(top_left, bottom_right)
    }

    /// Fit the viewport to show `bounds` inside a screen of `screen` size.
    pub fn fit_to_bounds(&mut self, bounds: Rect, screen: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (screen.width - padding * 2.0).max(1.0),
            (screen.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.zoom = self.clamp_zoom(scale_x.min(scale_y));

        let bounds_center = bounds.center();
        self.pan_x = screen.width / 2.0 - bounds_center.x * self.zoom;
        self.pan_y = screen.height / 2.0 - bounds_center.y * self.zoom;
    }
}
