//! Image entities. The board only stores a reference to the pixels.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Reference to an image plus its natural pixel dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// URL, path or data URI of the image.
    pub source: String,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
}

impl ImageRef {
    pub const DEFAULT_SIZE: Size = Size::new(240.0, 180.0);

    pub fn new(source: impl Into<String>, source_width: u32, source_height: u32) -> Self {
        Self {
            source: source.into(),
            source_width,
            source_height,
        }
    }

    /// Natural size scaled to fit within `max` while preserving aspect ratio.
    /// Returns None when the natural dimensions are unknown.
    pub fn fit_within(&self, max: Size) -> Option<Size> {
        if self.source_width == 0 || self.source_height == 0 {
            return None;
        }
        let natural = Size::new(self.source_width as f64, self.source_height as f64);
        let scale = (max.width / natural.width).min(max.height / natural.height).min(1.0);
        Some(Size::new(natural.width * scale, natural.height * scale))
    }
}
