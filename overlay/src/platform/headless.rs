//! In-memory backend for tests: scripted pointer, keys and theme; records
//! everything the widget asks of the window and shell.

use pressure_core::{FocusToken, Key, PlatformShell};

use super::{OverlayConfig, OverlayPlatform, PlatformError, PointerState};

pub const SCREEN_WIDTH: u32 = 1920;
pub const SCREEN_HEIGHT: u32 = 1080;

/// Window id reported for whatever held focus before the widget
pub const OTHER_WINDOW: FocusToken = FocusToken(0xbeef);

pub struct HeadlessOverlay {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub opacity: f32,
    pub click_through: bool,
    pub pixels: Vec<u8>,
    pub commits: usize,
    pub running: bool,

    pub pointer: PointerState,
    /// Report the pointer as unavailable
    pub pointer_lost: bool,
    pub keys: Vec<Key>,

    pub light_mode: bool,
    pub theme_changed: bool,
    pub dark_mode_calls: Vec<bool>,
    pub icon_updates: Vec<bool>,

    /// Currently focused window; `None` means the widget itself
    pub focused: Option<FocusToken>,
    pub restored: Vec<FocusToken>,
}

impl HeadlessOverlay {
    /// RGBA of the pixel at (`x`, `y`)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

impl OverlayPlatform for HeadlessOverlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        let (x, y) = config.position_on(SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(Self {
            width: config.width,
            height: config.height,
            x,
            y,
            opacity: 1.0,
            click_through: config.click_through,
            pixels: vec![0; (config.width * config.height * 4) as usize],
            commits: 0,
            running: true,
            pointer: PointerState::default(),
            pointer_lost: false,
            keys: Vec::new(),
            light_mode: false,
            theme_changed: false,
            dark_mode_calls: Vec::new(),
            icon_updates: Vec::new(),
            focused: Some(OTHER_WINDOW),
            restored: Vec::new(),
        })
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width * height * 4) as usize];
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn set_click_through(&mut self, enabled: bool) {
        self.click_through = enabled;
    }

    fn is_interactive(&self) -> bool {
        !self.click_through
    }

    fn pointer(&self) -> Option<PointerState> {
        (!self.pointer_lost).then_some(self.pointer)
    }

    fn take_key_events(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.keys)
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixels)
    }

    fn commit(&mut self) {
        self.commits += 1;
    }

    fn poll_events(&mut self) -> bool {
        self.running
    }
}

impl PlatformShell for HeadlessOverlay {
    fn is_light_mode(&self) -> bool {
        self.light_mode
    }

    fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode_calls.push(dark);
    }

    fn notify_icon_update(&mut self, inverted: bool) {
        self.icon_updates.push(inverted);
    }

    fn focused_window(&self) -> Option<FocusToken> {
        self.focused
    }

    fn focus_self(&mut self) {
        self.focused = None;
    }

    fn restore_focus(&mut self, token: FocusToken) {
        self.focused = Some(token);
        self.restored.push(token);
    }

    fn take_theme_changed(&mut self) -> bool {
        std::mem::take(&mut self.theme_changed)
    }
}
