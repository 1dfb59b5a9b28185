//! Software renderer using tiny-skia
//!
//! Every operation borrows the platform's premultiplied RGBA buffer as a
//! `PixmapMut` for the duration of the call. All drawing is on the CPU.

use tiny_skia::{
    Color, Paint, PathBuilder, Pixmap, PixmapMut, PixmapPaint, Stroke, Transform,
};

/// Stateless drawing primitives over raw RGBA buffers
#[derive(Debug, Default, Clone, Copy)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Create a new pixel buffer (RGBA format)
    pub fn create_buffer(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    /// Clear a pixel buffer with a color
    pub fn clear(&self, buffer: &mut [u8], width: u32, height: u32, color: Color) {
        if let Some(mut pixmap) = PixmapMut::from_bytes(buffer, width, height) {
            pixmap.fill(color);
        }
    }

    /// Source-over composite `src` with its top-left at (`x`, `y`), clipped
    /// to the buffer
    pub fn draw_pixmap(
        &self,
        buffer: &mut [u8],
        width: u32,
        height: u32,
        src: &Pixmap,
        x: i32,
        y: i32,
    ) {
        let Some(mut pixmap) = PixmapMut::from_bytes(buffer, width, height) else {
            return;
        };
        pixmap.draw_pixmap(
            x,
            y,
            src.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// One-pixel outline hugging the buffer edges
    pub fn stroke_rect(&self, buffer: &mut [u8], width: u32, height: u32, color: Color) {
        let Some(mut pixmap) = PixmapMut::from_bytes(buffer, width, height) else {
            return;
        };

        // Pixel centres, so the 1px line covers exactly the edge row/column
        let Some(rect) = tiny_skia::Rect::from_ltrb(
            0.5,
            0.5,
            width as f32 - 0.5,
            height as f32 - 0.5,
        ) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);

        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = false;

        let stroke = Stroke {
            width: 1.0,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PremultipliedColorU8;

    fn rgba(buffer: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [buffer[i], buffer[i + 1], buffer[i + 2], buffer[i + 3]]
    }

    #[test]
    fn test_clear_fills_every_pixel() {
        let mut buffer = Renderer::create_buffer(4, 3);
        Renderer::new().clear(&mut buffer, 4, 3, Color::from_rgba8(1, 2, 3, 255));
        assert!(buffer.chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
    }

    #[test]
    fn test_draw_pixmap_offsets_and_clips() {
        let mut src = Pixmap::new(2, 2).unwrap();
        src.fill(Color::from_rgba8(200, 0, 0, 255));

        let mut buffer = Renderer::create_buffer(4, 4);
        Renderer::new().draw_pixmap(&mut buffer, 4, 4, &src, 3, 1);

        assert_eq!(rgba(&buffer, 4, 3, 1), [200, 0, 0, 255]);
        assert_eq!(rgba(&buffer, 4, 3, 2), [200, 0, 0, 255]);
        assert_eq!(rgba(&buffer, 4, 2, 1), [0, 0, 0, 0]);
        assert_eq!(rgba(&buffer, 4, 3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_pixmap_blends_over() {
        let mut src = Pixmap::new(1, 1).unwrap();
        src.pixels_mut()[0] = PremultipliedColorU8::from_rgba(0, 0, 0, 0).unwrap();

        let mut buffer = Renderer::create_buffer(1, 1);
        let renderer = Renderer::new();
        renderer.clear(&mut buffer, 1, 1, Color::from_rgba8(9, 9, 9, 255));
        renderer.draw_pixmap(&mut buffer, 1, 1, &src, 0, 0);

        assert_eq!(rgba(&buffer, 1, 0, 0), [9, 9, 9, 255]);
    }

    #[test]
    fn test_stroke_rect_touches_edges_only() {
        let mut buffer = Renderer::create_buffer(8, 6);
        Renderer::new().stroke_rect(&mut buffer, 8, 6, Color::from_rgba8(100, 100, 100, 255));

        for (x, y) in [(0, 0), (7, 0), (0, 5), (7, 5), (3, 0), (0, 3)] {
            assert_eq!(rgba(&buffer, 8, x, y)[3], 255, "edge ({x}, {y})");
        }
        assert_eq!(rgba(&buffer, 8, 3, 3), [0, 0, 0, 0]);
    }
}
