//! Platform abstraction for the overlay window
//!
//! This module defines the trait that all platform backends must implement,
//! allowing the widget and compositor to be platform-agnostic. Backends also
//! implement [`PlatformShell`](pressure_core::PlatformShell) for theme and
//! focus handling.

use pressure_core::{Key, Point};
use thiserror::Error;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(test)]
pub(crate) mod headless;

/// Configuration for creating an overlay window
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Initial X position; centred on the primary screen when `None`
    pub x: Option<i32>,
    /// Initial Y position; centred on the primary screen when `None`
    pub y: Option<i32>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Window title / class name
    pub namespace: String,
    /// Whether clicks pass through the overlay
    pub click_through: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: pressure_core::interaction::BASE_WIDTH,
            height: pressure_core::interaction::BASE_HEIGHT,
            namespace: "pressure".to_string(),
            click_through: true,
        }
    }
}

impl OverlayConfig {
    /// Resolve the position, centring unset axes on a `screen_w` x `screen_h` screen
    pub fn position_on(&self, screen_w: u32, screen_h: u32) -> (i32, i32) {
        let x = self
            .x
            .unwrap_or((screen_w as i32 - self.width as i32) / 2);
        let y = self
            .y
            .unwrap_or((screen_h as i32 - self.height as i32) / 2);
        (x, y)
    }
}

/// Errors that can occur in platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to connect to display server
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Required protocol/feature not available
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    /// Buffer/memory allocation failed
    #[error("buffer error: {0}")]
    BufferError(String),
    /// Generic platform error
    #[error("platform error: {0}")]
    Other(String),
}

/// Global pointer position and primary button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub position: Point,
    pub left_down: bool,
}

/// Trait that all platform backends must implement
pub trait OverlayPlatform: Sized {
    /// Create a new overlay window with the given configuration
    fn new(config: OverlayConfig) -> Result<Self, PlatformError>;

    /// Get the current width of the overlay
    fn width(&self) -> u32;

    /// Get the current height of the overlay
    fn height(&self) -> u32;

    /// Get the current X position
    fn x(&self) -> i32;

    /// Get the current Y position
    fn y(&self) -> i32;

    /// Update the overlay position
    fn set_position(&mut self, x: i32, y: i32);

    /// Resize the overlay; the pixel buffer is reallocated to match
    fn set_size(&mut self, width: u32, height: u32);

    /// Whole-window transparency, 0.0 (invisible) to 1.0 (opaque)
    fn set_opacity(&mut self, opacity: f32);

    /// Enable or disable click-through mode
    fn set_click_through(&mut self, enabled: bool);

    /// Check if overlay is in interactive mode (not click-through)
    fn is_interactive(&self) -> bool;

    /// Global pointer position and left button state, polled.
    /// `None` when the pointer cannot be queried.
    fn pointer(&self) -> Option<PointerState>;

    /// Keys pressed while the overlay had focus since the last call
    fn take_key_events(&mut self) -> Vec<Key>;

    /// Get mutable access to the pixel buffer (premultiplied RGBA)
    /// Returns None if buffer is not ready
    fn pixel_buffer(&mut self) -> Option<&mut [u8]>;

    /// Commit the current pixel buffer to the screen
    fn commit(&mut self);

    /// Process pending platform events (non-blocking)
    /// Returns false if the overlay should close
    fn poll_events(&mut self) -> bool;
}

/// Re-export the appropriate platform for the current target
#[cfg(all(unix, not(target_os = "macos")))]
pub use x11::X11Overlay as NativeOverlay;

#[cfg(target_os = "windows")]
pub use windows::WindowsOverlay as NativeOverlay;

/// Show a blocking error to the user before a fatal exit
#[cfg(target_os = "windows")]
pub fn show_fatal_message(title: &str, message: &str) {
    windows::message_box(title, message);
}

/// Show an error to the user before a fatal exit
#[cfg(not(target_os = "windows"))]
pub fn show_fatal_message(title: &str, message: &str) {
    eprintln!("{title}: {message}");
}
