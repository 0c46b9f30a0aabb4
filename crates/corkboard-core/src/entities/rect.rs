//! Rectangle shapes.

use super::SerializableColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Fill and stroke of a rectangle shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectStyle {
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
}

impl RectStyle {
    pub const DEFAULT_SIZE: Size = Size::new(160.0, 100.0);

    pub fn filled(fill: SerializableColor) -> Self {
        Self {
            fill: Some(fill),
            ..Self::default()
        }
    }

    /// Largest corner radius that still fits a rectangle of the given size.
    pub fn effective_corner_radius(&self, width: f64, height: f64) -> f64 {
        self.corner_radius.clamp(0.0, width.min(height) / 2.0)
    }
}

impl Default for RectStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: SerializableColor::black(),
            stroke_width: 2.0,
            corner_radius: 0.0,
        }
    }
}
