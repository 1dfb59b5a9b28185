//! Pressure Overlay Library
//!
//! Glyph atlas, compositor and native windows for the countdown widget.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    widget                           │
//! │   CountdownWidget: one tick of input and drawing    │
//! ├─────────────────────────────────────────────────────┤
//! │            compositor          atlas / font         │
//! │     outlined text, resize    pre-rendered glyphs    │
//! ├─────────────────────────────────────────────────────┤
//! │                    manager                          │
//! │          OverlayWindow (window + renderer)          │
//! ├─────────────────────────────────────────────────────┤
//! │                    renderer                         │
//! │              tiny-skia primitives                   │
//! ├─────────────────────────────────────────────────────┤
//! │                    platform/                        │
//! │                  x11, windows                       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod atlas;
pub mod colors;
pub mod compositor;
pub mod font;
pub mod manager;
pub mod platform;
pub mod renderer;
pub mod widget;

// Re-export commonly used types
pub use atlas::{CHARSET, GlyphAtlas, GlyphEntry};
pub use colors::ColorScheme;
pub use compositor::{Compositor, RenderFrame};
pub use font::{FontError, FontFace, GlyphMask, GlyphSource};
pub use manager::OverlayWindow;
pub use platform::{
    NativeOverlay, OverlayConfig, OverlayPlatform, PlatformError, PointerState,
    show_fatal_message,
};
pub use renderer::Renderer;
pub use widget::CountdownWidget;
