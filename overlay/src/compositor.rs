//! Frame composition: outlined countdown text, or the resize bounding box

use pressure_core::Size;

use crate::atlas::GlyphAtlas;
use crate::colors::{resize_box, transparent};
use crate::manager::OverlayWindow;
use crate::platform::OverlayPlatform;

/// Outline copies are drawn at every neighbour one pixel away
const OUTLINE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Measured footprint of a string under the current atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderFrame {
    /// Sum of glyph widths
    pub text_width: u32,
    /// Tallest glyph
    pub text_height: u32,
    /// Window size that fits the text, margin included
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compositor {
    fit_margin: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Compositor {
    /// `fit_margin` scales the fitted window width; values below 1.0 are raised to it
    pub fn new(fit_margin: f32) -> Self {
        let fit_margin = if fit_margin.is_finite() {
            fit_margin.max(1.0)
        } else {
            1.0
        };
        Self { fit_margin }
    }

    pub fn fit_margin(&self) -> f32 {
        self.fit_margin
    }

    /// Footprint of `text`; characters without a glyph take no space
    pub fn measure(&self, atlas: &GlyphAtlas, text: &str) -> RenderFrame {
        let (text_width, text_height) = text
            .chars()
            .filter_map(|ch| atlas.get(ch))
            .fold((0u32, 0u32), |(w, h), glyph| {
                (w + glyph.width(), h.max(glyph.height()))
            });

        let width = (text_width as f32 * self.fit_margin).ceil() as u32;
        RenderFrame {
            text_width,
            text_height,
            size: Size::new(width, text_height),
        }
    }

    /// Draw one frame and commit it.
    ///
    /// While `resizing`, only the bounding box of the current window is drawn.
    /// Otherwise the window is first resized to fit `text`, then each glyph's
    /// outline is stamped at the eight neighbouring offsets beneath its fill.
    pub fn present<P: OverlayPlatform>(
        &self,
        window: &mut OverlayWindow<P>,
        atlas: &GlyphAtlas,
        text: &str,
        resizing: bool,
        opacity: f32,
    ) -> RenderFrame {
        window.set_opacity(opacity);

        if resizing {
            window.clear(transparent());
            window.stroke_rect(resize_box());
            window.commit();
            return RenderFrame {
                size: Size::new(window.width(), window.height()),
                ..RenderFrame::default()
            };
        }

        let frame = self.measure(atlas, text);
        if frame.size.width > 0
            && frame.size.height > 0
            && (frame.size.width, frame.size.height) != (window.width(), window.height())
        {
            tracing::debug!(
                width = frame.size.width,
                height = frame.size.height,
                "Fitting window to text"
            );
            window.set_size(frame.size.width, frame.size.height);
        }

        window.clear(transparent());

        let mut x = (window.width().saturating_sub(frame.text_width) / 2) as i32;
        for glyph in text.chars().filter_map(|ch| atlas.get(ch)) {
            for (dx, dy) in OUTLINE_OFFSETS {
                window.draw_pixmap(&glyph.outline, x + dx, dy);
            }
            window.draw_pixmap(&glyph.fill, x, 0);
            x += glyph.width() as i32;
        }

        window.commit();
        frame
    }
}
