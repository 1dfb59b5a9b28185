//! X11 platform implementation for the overlay window
//!
//! Uses XCB via x11rb for a transparent, always-on-top, override-redirect
//! window with click-through support. Requires a compositor for transparency.
//! Whole-window opacity is applied to the pixels on commit, so it works with
//! any compositor.

use std::fs::File;
use std::os::fd::AsFd;

use pressure_core::{FocusToken, Key, PlatformShell, Point};
use rustix::fs::{MemfdFlags, memfd_create};
use rustix::mm::{MapFlags, ProtFlags, mmap};
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::shm::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{OverlayConfig, OverlayPlatform, PlatformError, PointerState};

// Atoms needed for EWMH hints, theming and the icon
atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_SKIP_PAGER,
        _NET_WM_NAME,
        _NET_WM_ICON,
        _GTK_THEME_VARIANT,
        UTF8_STRING,
        CARDINAL,
        ATOM,
    }
}

const ICON_SIZE: u32 = 16;

// Keysyms from X11/keysymdef.h
const XK_RETURN: u32 = 0xff0d;
const XK_KP_ENTER: u32 = 0xff8d;
const XK_ESCAPE: u32 = 0xff1b;

/// SHM buffer for efficient pixel transfer
struct ShmBuffer {
    seg_id: shm::Seg,
    ptr: *mut u8,
    size: usize,
}

/// Keycode to keysym table, fetched once at startup
struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(conn: &RustConnection) -> Result<Self, PlatformError> {
        let setup = conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = conn
            .get_keyboard_mapping(min, max - min + 1)
            .map_err(|e| PlatformError::Other(e.to_string()))?
            .reply()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(Self {
            min_keycode: min,
            per_keycode: reply.keysyms_per_keycode as usize,
            keysyms: reply.keysyms,
        })
    }

    /// Unshifted keysym of `keycode`, mapped to the keys the widget handles
    fn key(&self, keycode: u8) -> Option<Key> {
        let index = keycode.checked_sub(self.min_keycode)? as usize * self.per_keycode;
        match *self.keysyms.get(index)? {
            XK_RETURN | XK_KP_ENTER => Some(Key::Return),
            XK_ESCAPE => Some(Key::Escape),
            sym @ 0x20..=0x7e => Some(Key::Char(sym as u8 as char)),
            _ => None,
        }
    }
}

pub struct X11Overlay {
    conn: RustConnection,
    root: Window,
    window: Window,
    gc: Gcontext,
    atoms: AtomCollection,
    keymap: Keymap,
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    depth: u8,

    // Pixel buffers
    pixel_data: Vec<u8>, // premultiplied RGBA from renderer
    shm_buffer: ShmBuffer,

    opacity: f32,
    click_through: bool,
    pending_keys: Vec<Key>,
    running: bool,
}

impl X11Overlay {
    /// Find a 32-bit ARGB visual for transparency
    fn find_argb_visual(screen: &Screen) -> Option<(Visualid, u8)> {
        for depth in &screen.allowed_depths {
            if depth.depth == 32 {
                for visual in &depth.visuals {
                    if visual.class == VisualClass::TRUE_COLOR {
                        return Some((visual.visual_id, depth.depth));
                    }
                }
            }
        }
        None
    }

    /// Create a shared memory buffer for efficient pixel transfer
    fn create_shm_buffer(
        conn: &RustConnection,
        width: u32,
        height: u32,
    ) -> Result<ShmBuffer, PlatformError> {
        let size = (width * height * 4) as usize;

        // Create anonymous shared memory
        let fd = memfd_create(c"pressure-x11-buffer", MemfdFlags::CLOEXEC)
            .map_err(|e| PlatformError::BufferError(format!("memfd_create failed: {}", e)))?;

        rustix::fs::ftruncate(&fd, size as u64)
            .map_err(|e| PlatformError::BufferError(format!("ftruncate failed: {}", e)))?;

        // SAFETY: fresh shared mapping of a file we just sized to `size`
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd.as_fd(),
                0,
            )
            .map_err(|e| PlatformError::BufferError(format!("mmap failed: {}", e)))?
        };

        let seg_id = conn
            .generate_id()
            .map_err(|e| PlatformError::BufferError(e.to_string()))?;

        // x11rb shm_attach_fd takes ownership of the fd
        let file = File::from(fd);
        conn.shm_attach_fd(seg_id, file, false)
            .map_err(|e| PlatformError::BufferError(format!("shm_attach_fd failed: {}", e)))?;

        Ok(ShmBuffer {
            seg_id,
            ptr: ptr as *mut u8,
            size,
        })
    }

    fn release_shm_buffer(&mut self) {
        let _ = self.conn.shm_detach(self.shm_buffer.seg_id);
        // SAFETY: ptr/size come from the mmap in create_shm_buffer
        unsafe {
            rustix::mm::munmap(self.shm_buffer.ptr as *mut _, self.shm_buffer.size).ok();
        }
    }

    /// Recreate SHM buffer after resize
    fn recreate_shm_buffer(&mut self) -> Result<(), PlatformError> {
        self.release_shm_buffer();
        self.shm_buffer = Self::create_shm_buffer(&self.conn, self.width, self.height)?;
        self.pixel_data
            .resize((self.width * self.height * 4) as usize, 0);
        Ok(())
    }

    /// Set EWMH hints for overlay behavior
    fn setup_window_hints(&self, title: &str) -> Result<(), PlatformError> {
        // Window type: dock (stays on top, no decorations)
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_WINDOW_TYPE,
                self.atoms.ATOM,
                &[self.atoms._NET_WM_WINDOW_TYPE_DOCK],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Window state: above, skip taskbar/pager
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_STATE,
                self.atoms.ATOM,
                &[
                    self.atoms._NET_WM_STATE_ABOVE,
                    self.atoms._NET_WM_STATE_SKIP_TASKBAR,
                    self.atoms._NET_WM_STATE_SKIP_PAGER,
                ],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                title.as_bytes(),
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(())
    }

    /// Update input shape for click-through
    fn update_input_shape(&self) {
        let full = [Rectangle {
            x: 0,
            y: 0,
            width: self.width as u16,
            height: self.height as u16,
        }];
        // Empty input region - clicks pass through
        let region: &[Rectangle] = if self.click_through { &[] } else { &full };
        let _ = self.conn.shape_rectangles(
            shape::SO::SET,
            shape::SK::INPUT,
            ClipOrdering::UNSORTED,
            self.window,
            0,
            0,
            region,
        );
        let _ = self.conn.flush();
    }

    /// Copy the frame into shared memory as BGRA scaled by the window opacity
    fn put_image(&mut self) {
        // SAFETY: the mapping stays valid until release_shm_buffer
        let shm_slice =
            unsafe { std::slice::from_raw_parts_mut(self.shm_buffer.ptr, self.shm_buffer.size) };

        let alpha = (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u32;
        let scale = |c: u8| (c as u32 * alpha / 255) as u8;
        for (dst, src) in shm_slice
            .chunks_exact_mut(4)
            .zip(self.pixel_data.chunks_exact(4))
        {
            dst[0] = scale(src[2]); // B
            dst[1] = scale(src[1]); // G
            dst[2] = scale(src[0]); // R
            dst[3] = scale(src[3]); // A
        }

        let _ = self.conn.shm_put_image(
            self.window,
            self.gc,
            self.width as u16,
            self.height as u16,
            0,
            0,
            self.width as u16,
            self.height as u16,
            0,
            0,
            self.depth,
            ImageFormat::Z_PIXMAP.into(),
            false,
            self.shm_buffer.seg_id,
            0,
        );
        let _ = self.conn.flush();
    }
}

impl OverlayPlatform for X11Overlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        // Intern atoms
        let atoms = AtomCollection::new(&conn)
            .map_err(|e| PlatformError::Other(e.to_string()))?
            .reply()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let keymap = Keymap::load(&conn)?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;

        // Check for required extensions
        conn.shape_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?;

        conn.shm_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?;

        // Find 32-bit visual for transparency
        let (visual, depth) = Self::find_argb_visual(screen)
            .ok_or_else(|| PlatformError::UnsupportedFeature("32-bit ARGB visual".into()))?;

        let colormap = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, visual)
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let (x, y) = config.position_on(
            screen.width_in_pixels as u32,
            screen.height_in_pixels as u32,
        );

        let window = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let win_aux = CreateWindowAux::new()
            .background_pixel(0)
            .border_pixel(0)
            .colormap(colormap)
            .event_mask(
                EventMask::EXPOSURE
                    | EventMask::KEY_PRESS
                    | EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::STRUCTURE_NOTIFY,
            )
            .override_redirect(1);

        conn.create_window(
            depth,
            window,
            root,
            x as i16,
            y as i16,
            config.width as u16,
            config.height as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &win_aux,
        )
        .map_err(|e| PlatformError::Other(e.to_string()))?;

        let gc = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_gc(gc, window, &CreateGCAux::new())
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let shm_buffer = Self::create_shm_buffer(&conn, config.width, config.height)?;

        let overlay = Self {
            conn,
            root,
            window,
            gc,
            atoms,
            keymap,
            width: config.width,
            height: config.height,
            x,
            y,
            depth,
            pixel_data: vec![0u8; (config.width * config.height * 4) as usize],
            shm_buffer,
            opacity: 1.0,
            click_through: config.click_through,
            pending_keys: Vec::new(),
            running: true,
        };

        overlay.setup_window_hints(&config.namespace)?;
        overlay.update_input_shape();

        overlay
            .conn
            .map_window(window)
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        overlay
            .conn
            .flush()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        tracing::debug!(window, x, y, width = config.width, height = config.height, "X11 overlay created");
        Ok(overlay)
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
        if x == self.x && y == self.y {
            return;
        }
        self.x = x;
        self.y = y;

        let _ = self
            .conn
            .configure_window(self.window, &ConfigureWindowAux::new().x(x).y(y));
        let _ = self.conn.flush();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;

        if let Err(e) = self.recreate_shm_buffer() {
            tracing::error!(error = %e, "Failed to resize X11 buffer");
        }

        let _ = self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new().width(width).height(height),
        );

        if !self.click_through {
            self.update_input_shape();
        }

        let _ = self.conn.flush();
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn set_click_through(&mut self, enabled: bool) {
        self.click_through = enabled;
        self.update_input_shape();
    }

    fn is_interactive(&self) -> bool {
        !self.click_through
    }

    fn pointer(&self) -> Option<PointerState> {
        let reply = self.conn.query_pointer(self.root).ok()?.reply().ok()?;
        Some(PointerState {
            position: Point::new(reply.root_x as i32, reply.root_y as i32),
            left_down: u16::from(reply.mask) & u16::from(KeyButMask::BUTTON1) != 0,
        })
    }

    fn take_key_events(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.pending_keys)
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        self.put_image();
    }

    fn poll_events(&mut self) -> bool {
        while let Ok(Some(event)) = self.conn.poll_for_event() {
            match event {
                x11rb::protocol::Event::Expose(e) if e.count == 0 => self.put_image(),
                x11rb::protocol::Event::KeyPress(e) => {
                    if let Some(key) = self.keymap.key(e.detail) {
                        self.pending_keys.push(key);
                    }
                }
                x11rb::protocol::Event::DestroyNotify(e) if e.window == self.window => {
                    self.running = false;
                    return false;
                }
                _ => {}
            }
        }
        self.running
    }
}

impl PlatformShell for X11Overlay {
    /// X11 has no system-wide theme setting; honour `GTK_THEME` when present
    fn is_light_mode(&self) -> bool {
        std::env::var("GTK_THEME")
            .map(|theme| !theme.to_ascii_lowercase().contains("dark"))
            .unwrap_or(false)
    }

    fn set_dark_mode(&mut self, dark: bool) {
        let variant: &[u8] = if dark { b"dark" } else { b"light" };
        let _ = self.conn.change_property8(
            PropMode::REPLACE,
            self.window,
            self.atoms._GTK_THEME_VARIANT,
            self.atoms.UTF8_STRING,
            variant,
        );
        let _ = self.conn.flush();
    }

    fn notify_icon_update(&mut self, inverted: bool) {
        let _ = self.conn.change_property32(
            PropMode::REPLACE,
            self.window,
            self.atoms._NET_WM_ICON,
            self.atoms.CARDINAL,
            &icon_argb(inverted),
        );
        let _ = self.conn.flush();
    }

    fn focused_window(&self) -> Option<FocusToken> {
        let reply = self.conn.get_input_focus().ok()?.reply().ok()?;
        // 0 is None, 1 is PointerRoot
        match reply.focus {
            0 | 1 => None,
            w if w == self.window => None,
            w => Some(FocusToken(w as u64)),
        }
    }

    fn focus_self(&mut self) {
        let _ = self
            .conn
            .set_input_focus(InputFocus::PARENT, self.window, x11rb::CURRENT_TIME);
        let _ = self.conn.flush();
    }

    fn restore_focus(&mut self, token: FocusToken) {
        let Ok(window) = Window::try_from(token.0) else {
            return;
        };
        let _ = self
            .conn
            .set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME);
        let _ = self.conn.flush();
    }

    fn take_theme_changed(&mut self) -> bool {
        false
    }
}

impl Drop for X11Overlay {
    fn drop(&mut self) {
        self.release_shm_buffer();
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.flush();
    }
}

/// `_NET_WM_ICON` payload: width, height, then ARGB pixels. A square in the
/// text colour with a one-pixel border in the outline colour.
fn icon_argb(inverted: bool) -> Vec<u32> {
    let (fill, border) = if inverted {
        (0xff17_1717, 0xfff0_f0f0)
    } else {
        (0xffff_ffff, 0xff0a_0a0a)
    };
    let mut data = vec![ICON_SIZE, ICON_SIZE];
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let edge = x == 0 || y == 0 || x == ICON_SIZE - 1 || y == ICON_SIZE - 1;
            data.push(if edge { border } else { fill });
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_lookup() {
        let keymap = Keymap {
            min_keycode: 8,
            per_keycode: 2,
            keysyms: vec![XK_ESCAPE, 0, 'r' as u32, 'R' as u32, XK_RETURN, 0, 0xffe1, 0],
        };
        assert_eq!(keymap.key(8), Some(Key::Escape));
        assert_eq!(keymap.key(9), Some(Key::Char('r')));
        assert_eq!(keymap.key(10), Some(Key::Return));
        // Shift_L
        assert_eq!(keymap.key(11), None);
        assert_eq!(keymap.key(7), None);
        assert_eq!(keymap.key(200), None);
    }

    #[test]
    fn test_icon_payload() {
        let icon = icon_argb(false);
        assert_eq!(icon.len(), 2 + (ICON_SIZE * ICON_SIZE) as usize);
        assert_eq!(&icon[..2], &[ICON_SIZE, ICON_SIZE]);
        assert_eq!(icon[2], 0xff0a_0a0a);
        assert_eq!(icon[2 + ICON_SIZE as usize + 1], 0xffff_ffff);
    }
}
