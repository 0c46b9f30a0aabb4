//! Free-standing text blocks and the typographic overrides shared with
//! sticky notes.

use super::SerializableColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font weight override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    /// Cycle to the next weight.
    pub fn next(self) -> Self {
        match self {
            FontWeight::Light => FontWeight::Regular,
            FontWeight::Regular => FontWeight::Bold,
            FontWeight::Bold => FontWeight::Light,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Typographic overrides. Unset fields fall back to the renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Typography {
    /// Font size used when no override is set.
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Effective font size.
    pub fn font_size_or_default(&self) -> f64 {
        self.font_size.unwrap_or(Self::DEFAULT_FONT_SIZE)
    }
}

/// A text block without a background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub typography: Typography,
}

impl TextBlock {
    pub const DEFAULT_SIZE: Size = Size::new(200.0, 40.0);

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            typography: Typography::default(),
        }
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.typography.font_size = Some(font_size);
        self
    }
}
