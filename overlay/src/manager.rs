//! Overlay window wrapper
//!
//! Pairs a platform backend with the renderer so callers draw in terms of
//! colours and pixmaps instead of raw buffers.

use pressure_core::{Key, Rect};
use tiny_skia::{Color, Pixmap};

use crate::platform::{NativeOverlay, OverlayConfig, OverlayPlatform, PlatformError, PointerState};
use crate::renderer::Renderer;

/// A managed overlay window with its own renderer
pub struct OverlayWindow<P: OverlayPlatform = NativeOverlay> {
    platform: P,
    renderer: Renderer,
}

impl<P: OverlayPlatform> OverlayWindow<P> {
    /// Create a new overlay window
    pub fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Ok(Self::from_platform(P::new(config)?))
    }

    pub fn from_platform(platform: P) -> Self {
        Self {
            platform,
            renderer: Renderer::new(),
        }
    }

    /// Get the window width
    pub fn width(&self) -> u32 {
        self.platform.width()
    }

    /// Get the window height
    pub fn height(&self) -> u32 {
        self.platform.height()
    }

    pub fn x(&self) -> i32 {
        self.platform.x()
    }

    pub fn y(&self) -> i32 {
        self.platform.y()
    }

    /// Current screen rectangle
    pub fn rect(&self) -> Rect {
        Rect::new(self.x(), self.y(), self.width(), self.height())
    }

    /// Set the window position
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.platform.set_position(x, y);
    }

    /// Set the window size
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.platform.set_size(width, height);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.platform.set_opacity(opacity);
    }

    /// Enable or disable click-through mode
    pub fn set_click_through(&mut self, enabled: bool) {
        self.platform.set_click_through(enabled);
    }

    /// Check if overlay is in interactive mode (not click-through)
    pub fn is_interactive(&self) -> bool {
        self.platform.is_interactive()
    }

    /// Clear the overlay with a color
    pub fn clear(&mut self, color: Color) {
        let width = self.platform.width();
        let height = self.platform.height();
        if let Some(buffer) = self.platform.pixel_buffer() {
            self.renderer.clear(buffer, width, height, color);
        }
    }

    /// Composite a pixmap at (`x`, `y`) in window coordinates
    pub fn draw_pixmap(&mut self, pixmap: &Pixmap, x: i32, y: i32) {
        let width = self.platform.width();
        let height = self.platform.height();
        if let Some(buffer) = self.platform.pixel_buffer() {
            self.renderer
                .draw_pixmap(buffer, width, height, pixmap, x, y);
        }
    }

    /// Outline the window bounds
    pub fn stroke_rect(&mut self, color: Color) {
        let width = self.platform.width();
        let height = self.platform.height();
        if let Some(buffer) = self.platform.pixel_buffer() {
            self.renderer.stroke_rect(buffer, width, height, color);
        }
    }

    /// Commit the current frame to the screen
    pub fn commit(&mut self) {
        self.platform.commit();
    }

    /// Poll for events (non-blocking)
    /// Returns false if the window should close
    pub fn poll_events(&mut self) -> bool {
        self.platform.poll_events()
    }

    pub fn pointer(&self) -> Option<PointerState> {
        self.platform.pointer()
    }

    pub fn take_key_events(&mut self) -> Vec<Key> {
        self.platform.take_key_events()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}
