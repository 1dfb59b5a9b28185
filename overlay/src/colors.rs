use tiny_skia::{Color, ColorU8};

#[inline]
pub fn transparent() -> Color {
    Color::from_rgba8(0, 0, 0, 0)
}

/// Bounding box drawn while resizing
#[inline]
pub fn resize_box() -> Color {
    Color::from_rgba8(100, 100, 100, 255)
}

/// Text colours for one scheme. The fill runs top to bottom through a
/// vertical gradient; the outline is solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub fill_top: ColorU8,
    pub fill_bottom: ColorU8,
    pub outline: ColorU8,
}

// ─────────────────────────────────────────────────────────────────────────
// Colour Schemes
// ─────────────────────────────────────────────────────────────────────────

/// Light text on dark outline, or the inverse for light desktops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Normal,
    Inverted,
}

impl ColorScheme {
    /// Scheme matching the desktop theme
    pub fn for_light_mode(light: bool) -> Self {
        if light {
            ColorScheme::Inverted
        } else {
            ColorScheme::Normal
        }
    }

    pub fn is_inverted(self) -> bool {
        self == ColorScheme::Inverted
    }

    pub fn toggled(self) -> Self {
        match self {
            ColorScheme::Normal => ColorScheme::Inverted,
            ColorScheme::Inverted => ColorScheme::Normal,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ColorScheme::Normal => Palette {
                fill_top: ColorU8::from_rgba(255, 255, 255, 255),
                fill_bottom: ColorU8::from_rgba(208, 208, 208, 255),
                outline: ColorU8::from_rgba(10, 10, 10, 255),
            },
            ColorScheme::Inverted => Palette {
                fill_top: ColorU8::from_rgba(23, 23, 23, 255),
                fill_bottom: ColorU8::from_rgba(12, 12, 12, 255),
                outline: ColorU8::from_rgba(240, 240, 240, 255),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_follows_theme() {
        assert_eq!(ColorScheme::for_light_mode(false), ColorScheme::Normal);
        assert_eq!(ColorScheme::for_light_mode(true), ColorScheme::Inverted);
        assert_eq!(ColorScheme::Normal.toggled().toggled(), ColorScheme::Normal);
    }

    #[test]
    fn test_inverted_palette_swaps_contrast() {
        let normal = ColorScheme::Normal.palette();
        let inverted = ColorScheme::Inverted.palette();
        assert!(normal.fill_top.red() > normal.outline.red());
        assert!(inverted.fill_top.red() < inverted.outline.red());
    }
}
