//! Font loading and per-character rasterisation
//!
//! The widget ships one font file. It is loaded into a private font database
//! so shaping never falls back to system fonts; a character the file does not
//! cover is reported as missing instead of being drawn from another face.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cosmic_text::fontdb;
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use thiserror::Error;

/// Line height as a multiple of the point size
const LINE_HEIGHT: f32 = 1.2;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable font face in {}", .path.display())]
    NoFace { path: PathBuf },
}

/// Coverage bitmap of one character, sized to its advance and line height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per pixel, `width * height` long
    pub coverage: Vec<u8>,
}

impl GlyphMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0; (width * height) as usize],
        }
    }

    /// Copy `src` (a `src_w` x `src_h` coverage image) with its top-left at
    /// (`x`, `y`), clipping to the mask bounds
    fn blit(&mut self, src: &[u8], src_w: u32, src_h: u32, x: i32, y: i32) {
        for sy in 0..src_h as i32 {
            let dy = y + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..src_w as i32 {
                let dx = x + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let Some(&value) = src.get((sy * src_w as i32 + sx) as usize) else {
                    continue;
                };
                let dst = (dy as u32 * self.width + dx as u32) as usize;
                self.coverage[dst] = self.coverage[dst].max(value);
            }
        }
    }
}

/// Anything that can turn a character into a coverage mask at a point size
pub trait GlyphSource {
    fn point_size(&self) -> u32;

    fn set_point_size(&mut self, point_size: u32);

    /// Rasterise `ch`, or `None` when the font has no glyph for it
    fn rasterize(&mut self, ch: char) -> Option<GlyphMask>;
}

/// A single font face rendered through cosmic-text
pub struct FontFace {
    font_system: FontSystem,
    swash_cache: SwashCache,
    face_id: fontdb::ID,
    family: String,
    point_size: u32,
}

impl FontFace {
    pub fn load(path: &Path, point_size: u32) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, point_size).ok_or_else(|| FontError::NoFace {
            path: path.to_path_buf(),
        })
    }

    pub fn from_bytes(bytes: Vec<u8>, point_size: u32) -> Option<Self> {
        let mut db = fontdb::Database::new();
        let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(bytes)));
        let face_id = *ids.first()?;
        let family = db
            .face(face_id)?
            .families
            .first()
            .map(|(name, _)| name.clone())?;

        let locale = sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string());
        tracing::debug!(%family, %locale, point_size, "Font loaded");

        Some(Self {
            font_system: FontSystem::new_with_locale_and_db(locale, db),
            swash_cache: SwashCache::new(),
            face_id,
            family,
            point_size,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }
}

impl GlyphSource for FontFace {
    fn point_size(&self) -> u32 {
        self.point_size
    }

    fn set_point_size(&mut self, point_size: u32) {
        self.point_size = point_size.max(1);
    }

    fn rasterize(&mut self, ch: char) -> Option<GlyphMask> {
        let size = self.point_size as f32;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * LINE_HEIGHT));

        let mut utf8 = [0u8; 4];
        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_text(
            &mut self.font_system,
            ch.encode_utf8(&mut utf8),
            &attrs,
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let (advance, line_height, physical) = {
            let run = buffer.layout_runs().next()?;
            let glyph = run.glyphs.first()?;
            if glyph.glyph_id == 0 || glyph.font_id != self.face_id {
                return None;
            }
            (
                glyph.w,
                run.line_height,
                glyph.physical((0.0, run.line_y), 1.0),
            )
        };

        let mut mask = GlyphMask::new(
            advance.ceil().max(1.0) as u32,
            line_height.ceil().max(1.0) as u32,
        );

        // Whitespace has no image
        let Some(image) = self
            .swash_cache
            .get_image(&mut self.font_system, physical.cache_key)
        else {
            return Some(mask);
        };

        let x = physical.x + image.placement.left;
        let y = physical.y - image.placement.top;
        let (w, h) = (image.placement.width, image.placement.height);
        match image.content {
            SwashContent::Mask => mask.blit(&image.data, w, h, x, y),
            SwashContent::Color => {
                let alpha: Vec<u8> = image.data.chunks_exact(4).map(|px| px[3]).collect();
                mask.blit(&alpha, w, h, x, y);
            }
            SwashContent::SubpixelMask => {
                let alpha: Vec<u8> = image
                    .data
                    .chunks_exact(4)
                    .map(|px| px[0].max(px[1]).max(px[2]))
                    .collect();
                mask.blit(&alpha, w, h, x, y);
            }
        }
        Some(mask)
    }
}

/// Solid block glyphs for tests: half the point size wide, the point size
/// tall. Space is empty; the colon is optional.
#[cfg(test)]
pub(crate) struct BlockGlyphs {
    pub point_size: u32,
    pub has_colon: bool,
    pub rasterized: usize,
}

#[cfg(test)]
impl BlockGlyphs {
    pub fn new(point_size: u32) -> Self {
        Self {
            point_size,
            has_colon: true,
            rasterized: 0,
        }
    }
}

#[cfg(test)]
impl GlyphSource for BlockGlyphs {
    fn point_size(&self) -> u32 {
        self.point_size
    }

    fn set_point_size(&mut self, point_size: u32) {
        self.point_size = point_size;
    }

    fn rasterize(&mut self, ch: char) -> Option<GlyphMask> {
        let value = match ch {
            '0'..='9' => 255,
            ' ' => 0,
            ':' if self.has_colon => 128,
            _ => return None,
        };
        self.rasterized += 1;
        let mut mask = GlyphMask::new((self.point_size / 2).max(1), self.point_size.max(1));
        mask.coverage.fill(value);
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blit_clips_to_bounds() {
        let mut mask = GlyphMask::new(3, 3);
        mask.blit(&[200; 4], 2, 2, 2, -1);
        assert_eq!(mask.coverage, vec![0, 0, 200, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_missing_font_file() {
        let err = FontFace::load(Path::new("/nonexistent/pressure/font.ttf"), 52)
            .err()
            .unwrap();
        assert!(matches!(err, FontError::Read { .. }));
    }

    #[test]
    fn test_garbage_bytes_have_no_face() {
        assert!(FontFace::from_bytes(b"not a font".to_vec(), 52).is_none());
    }
}
