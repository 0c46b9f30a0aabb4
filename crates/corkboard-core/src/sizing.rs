//! Initial sizing of new entities.
//!
//! Text measurement lives in the host. The board only asks for a starting
//! size and clamps whatever comes back.

use crate::entities::EntityKind;
use kurbo::Size;

/// Suggests a starting size for a new entity.
pub trait SizeProvider: Send + Sync {
    /// Return `None` to fall back to the kind's default size.
    fn suggest_size(&self, kind: EntityKind, text: &str) -> Option<Size>;
}

/// Per-kind fixed defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSizer;

impl SizeProvider for DefaultSizer {
    fn suggest_size(&self, kind: EntityKind, _text: &str) -> Option<Size> {
        Some(kind.default_size())
    }
}

impl<F> SizeProvider for F
where
    F: Fn(EntityKind, &str) -> Option<Size> + Send + Sync,
{
    fn suggest_size(&self, kind: EntityKind, text: &str) -> Option<Size> {
        self(kind, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizer() {
        for kind in EntityKind::ALL {
            assert_eq!(DefaultSizer.suggest_size(kind, ""), Some(kind.default_size()));
        }
    }

    #[test]
    fn test_closure_sizer() {
        let sizer = |kind: EntityKind, text: &str| {
            kind.has_text()
                .then(|| Size::new(8.0 * text.len() as f64, 24.0))
        };
        assert_eq!(sizer.suggest_size(EntityKind::Text, "abcd"), Some(Size::new(32.0, 24.0)));
        assert_eq!(sizer.suggest_size(EntityKind::Rect, "abcd"), None);
    }
}
