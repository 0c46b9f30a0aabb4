//! Sticky notes.

use super::{SerializableColor, Typography};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// A colored note with body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    #[serde(default)]
    pub text: String,
    /// Background color of the note.
    #[serde(default = "StickyNote::default_color")]
    pub color: SerializableColor,
    #[serde(default)]
    pub typography: Typography,
}

impl StickyNote {
    pub const DEFAULT_SIZE: Size = Size::new(150.0, 150.0);

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    fn default_color() -> SerializableColor {
        SerializableColor::new(255, 235, 130, 255)
    }
}

impl Default for StickyNote {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Self::default_color(),
            typography: Typography::default(),
        }
    }
}
