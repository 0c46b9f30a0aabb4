//! Zoom-aware proximity and hover detection.
//!
//! All distances passed in are canvas-space. Thresholds and buffers are
//! configured in screen space and divided by the (clamped) zoom, so hit areas
//! feel the same size on screen at any zoom level.

use crate::entities::{Entity, EntityId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How close the cursor is to an interactive target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProximityLevel {
    /// Close enough for a full-opacity affordance.
    Primary,
    /// Near enough for a reduced-opacity affordance.
    Secondary,
    /// Not rendered.
    Hidden,
}

/// Distance thresholds for the proximity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityThresholds {
    pub primary: f64,
    pub secondary: f64,
}

impl Default for ProximityThresholds {
    fn default() -> Self {
        Self {
            primary: 30.0,
            secondary: 60.0,
        }
    }
}

impl ProximityThresholds {
    /// Scale every threshold by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            primary: self.primary * factor,
            secondary: self.secondary * factor,
        }
    }
}

/// Classify a distance into a proximity tier.
pub fn proximity_level(distance: f64, thresholds: &ProximityThresholds) -> ProximityLevel {
    if distance <= thresholds.primary {
        ProximityLevel::Primary
    } else if distance <= thresholds.secondary {
        ProximityLevel::Secondary
    } else {
        ProximityLevel::Hidden
    }
}

/// Clamp `zoom` into `[min_zoom, max_zoom]`, guarding against degenerate input.
fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    zoom.clamp(min_zoom, max_zoom.max(min_zoom))
}

/// Convert screen-space thresholds into canvas-space thresholds for `zoom`.
pub fn zoom_aware_thresholds(
    base: &ProximityThresholds,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> ProximityThresholds {
    base.scaled(1.0 / clamp_zoom(zoom, min_zoom, max_zoom))
}

/// Hover buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoverBufferConfig {
    /// Screen-space buffer in sparse regions.
    pub base_buffer: f64,
    /// Screen-space buffer when the layout around the cursor is dense.
    pub dense_buffer: f64,
    /// Canvas-space radius used for density detection.
    pub density_radius: f64,
    /// Neighbor count at which a region counts as dense.
    pub dense_threshold: usize,
}

impl Default for HoverBufferConfig {
    fn default() -> Self {
        Self {
            base_buffer: 20.0,
            dense_buffer: 8.0,
            density_radius: 80.0,
            dense_threshold: 3,
        }
    }
}

/// Canvas-space hover buffer for the current zoom and density. `zoom` is
/// clamped into `[min_zoom, max_zoom]` first.
pub fn adaptive_buffer(config: &HoverBufferConfig, zoom: f64, min_zoom: f64, max_zoom: f64, is_dense: bool) -> f64 {
    let base = if is_dense {
        config.dense_buffer
    } else {
        config.base_buffer
    };
    base / clamp_zoom(zoom, min_zoom, max_zoom)
}

/// Distance from `point` to the nearest point of `rect` (zero inside).
pub fn distance_to_rect(point: Point, rect: Rect) -> f64 {
    let dx = (rect.x0 - point.x).max(0.0).max(point.x - rect.x1);
    let dy = (rect.y0 - point.y).max(0.0).max(point.y - rect.y1);
    dx.hypot(dy)
}

/// Whether at least `config.dense_threshold` rectangles lie within
/// `config.density_radius` of the cursor.
pub fn is_dense_layout<I>(cursor: Point, rects: I, config: &HoverBufferConfig) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    rects
        .into_iter()
        .filter(|rect| distance_to_rect(cursor, *rect) <= config.density_radius)
        .take(config.dense_threshold)
        .count()
        >= config.dense_threshold
}

/// A target considered for hovering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverCandidate {
    pub id: EntityId,
    pub bounds: Rect,
    pub z_index: i64,
}

impl From<&Entity> for HoverCandidate {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            bounds: entity.bounds(),
            z_index: entity.z_index,
        }
    }
}

/// Candidates whose bounds, inflated by `buffer`, contain the cursor,
/// ordered from the highest stacking order down.
pub fn elements_in_hover_area(cursor: Point, candidates: &[HoverCandidate], buffer: f64) -> Vec<HoverCandidate> {
    let mut hits: Vec<HoverCandidate> = candidates
        .iter()
        .filter(|c| c.bounds.inflate(buffer, buffer).contains(cursor))
        .copied()
        .collect();
    // Stable sort keeps document order among equal z-indices, later entries first.
    hits.reverse();
    hits.sort_by(|a, b| b.z_index.cmp(&a.z_index));
    hits
}

/// The topmost candidate under the cursor.
pub fn priority_hover_element(cursor: Point, candidates: &[HoverCandidate], buffer: f64) -> Option<EntityId> {
    elements_in_hover_area(cursor, candidates, buffer)
        .first()
        .map(|c| c.id)
}

/// Resolve the hover target for a cursor over a set of entities, choosing
/// the buffer from the local density.
pub fn hover_target<'a, I>(
    cursor: Point,
    entities: I,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    config: &HoverBufferConfig,
) -> Option<EntityId>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let candidates: Vec<HoverCandidate> = entities.into_iter().map(HoverCandidate::from).collect();
    let dense = is_dense_layout(cursor, candidates.iter().map(|c| c.bounds), config);
    let buffer = adaptive_buffer(config, zoom, min_zoom, max_zoom, dense);
    priority_hover_element(cursor, &candidates, buffer)
}
