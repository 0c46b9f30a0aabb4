//! Entity definitions for the board.
//!
//! Every placeable object shares the same rectangular frame (position, size,
//! rotation, stacking order, lock flag, timestamps). What differs per kind is
//! carried in [`EntityBody`], which is serialized as a `kind`-tagged union so
//! the discriminant sits next to the common fields.

mod image;
mod rect;
mod sticky;
mod text;

pub use image::ImageRef;
pub use rect::RectStyle;
pub use sticky::StickyNote;
pub use text::{FontWeight, TextAlign, TextBlock, Typography};

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for entities.
pub type EntityId = Uuid;

/// Minimum interactive width of any entity.
pub const MIN_WIDTH: f64 = 20.0;
/// Minimum interactive height of any entity.
pub const MIN_HEIGHT: f64 = 10.0;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Clamp a size to the minimum interactive dimensions.
pub fn clamp_size(width: f64, height: f64) -> (f64, f64) {
    let width = if width.is_finite() { width.max(MIN_WIDTH) } else { MIN_WIDTH };
    let height = if height.is_finite() { height.max(MIN_HEIGHT) } else { MIN_HEIGHT };
    (width, height)
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Discriminant of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Sticky,
    Text,
    Rect,
    Image,
}

impl EntityKind {
    /// All entity kinds.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Sticky,
        EntityKind::Text,
        EntityKind::Rect,
        EntityKind::Image,
    ];

    /// Default size used when neither the caller nor a sizing collaborator
    /// provides one.
    pub fn default_size(self) -> Size {
        match self {
            EntityKind::Sticky => StickyNote::DEFAULT_SIZE,
            EntityKind::Text => TextBlock::DEFAULT_SIZE,
            EntityKind::Rect => RectStyle::DEFAULT_SIZE,
            EntityKind::Image => ImageRef::DEFAULT_SIZE,
        }
    }

    /// Whether this kind carries body text.
    pub fn has_text(self) -> bool {
        matches!(self, EntityKind::Sticky | EntityKind::Text)
    }
}

/// Kind-specific payload of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityBody {
    Sticky(StickyNote),
    Text(TextBlock),
    Rect(RectStyle),
    Image(ImageRef),
}

impl EntityBody {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBody::Sticky(_) => EntityKind::Sticky,
            EntityBody::Text(_) => EntityKind::Text,
            EntityBody::Rect(_) => EntityKind::Rect,
            EntityBody::Image(_) => EntityKind::Image,
        }
    }

    /// Body text for sticky notes and text blocks.
    pub fn text(&self) -> Option<&str> {
        match self {
            EntityBody::Sticky(s) => Some(&s.text),
            EntityBody::Text(t) => Some(&t.text),
            EntityBody::Rect(_) | EntityBody::Image(_) => None,
        }
    }

    /// Replace the body text. Returns false for kinds without text.
    pub fn set_text(&mut self, text: String) -> bool {
        match self {
            EntityBody::Sticky(s) => {
                s.text = text;
                true
            }
            EntityBody::Text(t) => {
                t.text = text;
                true
            }
            EntityBody::Rect(_) | EntityBody::Image(_) => false,
        }
    }
}

impl From<EntityKind> for EntityBody {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Sticky => EntityBody::Sticky(StickyNote::default()),
            EntityKind::Text => EntityBody::Text(TextBlock::default()),
            EntityKind::Rect => EntityBody::Rect(RectStyle::default()),
            EntityKind::Image => EntityBody::Image(ImageRef::default()),
        }
    }
}

impl From<StickyNote> for EntityBody {
    fn from(note: StickyNote) -> Self {
        EntityBody::Sticky(note)
    }
}

impl From<TextBlock> for EntityBody {
    fn from(block: TextBlock) -> Self {
        EntityBody::Text(block)
    }
}

impl From<RectStyle> for EntityBody {
    fn from(style: RectStyle) -> Self {
        EntityBody::Rect(style)
    }
}

impl From<ImageRef> for EntityBody {
    fn from(image: ImageRef) -> Self {
        EntityBody::Image(image)
    }
}

/// Where and how large a new entity should be.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    /// Top-left corner in canvas coordinates.
    pub position: Point,
    /// Explicit size. When absent the board asks its sizing collaborator.
    pub size: Option<Size>,
}

impl Placement {
    /// Place at a point with the default size.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            size: None,
        }
    }

    /// Use an explicit size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }
}

/// A placeable document object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub(crate) id: EntityId,
    /// Top-left corner position.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Stacking order; higher values paint above lower ones.
    pub z_index: i64,
    #[serde(default)]
    pub locked: bool,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(flatten)]
    pub body: EntityBody,
}

impl Entity {
    /// Create a new entity. The size is clamped to the minimum dimensions.
    pub fn new(body: EntityBody, position: Point, size: Size, z_index: i64) -> Self {
        let (width, height) = clamp_size(size.width, size.height);
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            rotation: 0.0,
            z_index,
            locked: false,
            created_at: now,
            updated_at: now,
            body,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    /// Axis-aligned bounding rectangle in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn text(&self) -> Option<&str> {
        self.body.text()
    }

    /// Apply a partial update.
    ///
    /// Returns what changed so the caller can decide whether connectors need
    /// to be re-derived. Sizes are clamped to the minimum dimensions and
    /// non-finite positions or rotations are ignored.
    pub fn apply(&mut self, patch: &EntityPatch) -> PatchEffect {
        let mut effect = PatchEffect::default();

        if let Some(position) = patch.position.filter(|p| p.is_finite()) {
            if position != self.position {
                self.position = position;
                effect.geometry = true;
            }
        }
        if patch.width.is_some() || patch.height.is_some() {
            let (width, height) = clamp_size(
                patch.width.unwrap_or(self.width),
                patch.height.unwrap_or(self.height),
            );
            if width != self.width || height != self.height {
                self.width = width;
                self.height = height;
                effect.geometry = true;
            }
        }
        if let Some(rotation) = patch.rotation.filter(|r| r.is_finite()) {
            if rotation != self.rotation {
                self.rotation = rotation;
                effect.content = true;
            }
        }
        if let Some(locked) = patch.locked {
            if locked != self.locked {
                self.locked = locked;
                effect.content = true;
            }
        }
        if let Some(body) = &patch.body {
            if body.kind() == self.kind() {
                if *body != self.body {
                    self.body = body.clone();
                    effect.content = true;
                }
            } else {
                log::debug!(
                    "Ignoring {:?} body for {:?} entity {}",
                    body.kind(),
                    self.kind(),
                    self.id
                );
            }
        }
        if let Some(text) = &patch.text {
            if self.body.text() != Some(text.as_str()) && self.body.set_text(text.clone()) {
                effect.content = true;
            }
        }

        if effect.changed() {
            self.updated_at = now_millis();
        }
        effect
    }
}

/// Sparse update for an entity. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Replacement payload; ignored when its kind differs from the entity's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<EntityBody>,
    /// New body text (sticky and text entities only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl EntityPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn frame(rect: Rect) -> Self {
        Self {
            position: Some(Point::new(rect.x0, rect.y0)),
            width: Some(rect.width()),
            height: Some(rect.height()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Whether the patch only toggles the lock flag.
    pub fn is_lock_only(&self) -> bool {
        self.locked.is_some()
            && self.position.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
            && self.body.is_none()
            && self.text.is_none()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What an [`EntityPatch`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchEffect {
    /// Position or size changed.
    pub geometry: bool,
    /// Anything else changed.
    pub content: bool,
}

impl PatchEffect {
    pub fn changed(&self) -> bool {
        self.geometry || self.content
    }
}
