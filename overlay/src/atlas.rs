//! Pre-rendered glyphs for every character a countdown can contain
//!
//! Each character gets a gradient fill and a solid outline pixmap. The table
//! is fixed-size and indexed by character, and is always rebuilt from scratch.

use tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

use crate::colors::{ColorScheme, Palette};
use crate::font::{GlyphMask, GlyphSource};

/// Characters the countdown formatter can emit
pub const CHARSET: [char; 12] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ' ', ':'];

const WHITE: ColorU8 = ColorU8::from_rgba(255, 255, 255, 255);

fn slot(ch: char) -> Option<usize> {
    match ch {
        '0'..='9' => Some(ch as usize - '0' as usize),
        ' ' => Some(10),
        ':' => Some(11),
        _ => None,
    }
}

/// Fill and outline renderings of one character
pub struct GlyphEntry {
    pub fill: Pixmap,
    pub outline: Pixmap,
}

impl GlyphEntry {
    pub fn width(&self) -> u32 {
        self.fill.width()
    }

    pub fn height(&self) -> u32 {
        self.fill.height()
    }
}

pub struct GlyphAtlas {
    slots: [Option<GlyphEntry>; CHARSET.len()],
    generation: u64,
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphAtlas {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            generation: 0,
        }
    }

    /// Release every glyph
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Re-render the whole charset.
    ///
    /// Without a font the atlas is left empty and nothing will be drawn.
    pub fn rebuild<F: GlyphSource>(&mut self, font: Option<&mut F>, scheme: ColorScheme) {
        self.clear();
        self.generation += 1;

        let Some(font) = font else {
            tracing::warn!("No font available, glyph atlas left empty");
            return;
        };

        let palette = scheme.palette();
        for (entry, ch) in self.slots.iter_mut().zip(CHARSET) {
            *entry = font.rasterize(ch).and_then(|mask| render_entry(&mask, &palette));
        }

        if !self.has_colon() {
            tracing::warn!("Font has no ':' glyph, separators will be spaces");
        }
        tracing::info!(
            point_size = font.point_size(),
            glyphs = self.len(),
            ?scheme,
            generation = self.generation,
            "Glyph atlas rebuilt"
        );
    }

    pub fn get(&self, ch: char) -> Option<&GlyphEntry> {
        slot(ch).and_then(|i| self.slots[i].as_ref())
    }

    pub fn has_colon(&self) -> bool {
        self.get(':').is_some()
    }

    /// Number of characters with a rendered glyph
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live pixmaps held: one fill and one outline per glyph
    pub fn texture_count(&self) -> usize {
        self.len() * 2
    }

    /// Incremented on every rebuild
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn render_entry(mask: &GlyphMask, palette: &Palette) -> Option<GlyphEntry> {
    let mut fill = tinted(mask, WHITE)?;
    apply_vertical_gradient(&mut fill, palette.fill_top, palette.fill_bottom);
    let outline = tinted(mask, palette.outline)?;
    Some(GlyphEntry { fill, outline })
}

/// Solid `color` with the mask as alpha
fn tinted(mask: &GlyphMask, color: ColorU8) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(mask.width, mask.height)?;
    for (px, &alpha) in pixmap.pixels_mut().iter_mut().zip(&mask.coverage) {
        *px = premultiply(color.red(), color.green(), color.blue(), alpha);
    }
    Some(pixmap)
}

/// Recolour every pixel from `top` (first row) towards `bottom`, keeping each
/// pixel's existing alpha
pub fn apply_vertical_gradient(pixmap: &mut Pixmap, top: ColorU8, bottom: ColorU8) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as f32;

    for (row, pixels) in pixmap.pixels_mut().chunks_mut(width).enumerate() {
        let t = row as f32 / height;
        let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
        let (r, g, b) = (
            lerp(top.red(), bottom.red()),
            lerp(top.green(), bottom.green()),
            lerp(top.blue(), bottom.blue()),
        );
        for px in pixels {
            *px = premultiply(r, g, b, px.alpha());
        }
    }
}

/// `channel * alpha / 255` per colour channel
fn premultiply(r: u8, g: u8, b: u8, a: u8) -> PremultipliedColorU8 {
    let scale = |c: u8| (c as u16 * a as u16 / 255) as u8;
    PremultipliedColorU8::from_rgba(scale(r), scale(g), scale(b), a)
        .unwrap_or(PremultipliedColorU8::TRANSPARENT)
}
