//! Windows platform implementation for the overlay window
//!
//! Uses a Win32 layered window: per-pixel alpha from the frame, whole-window
//! opacity through the blend function's constant alpha, and click-through via
//! `WS_EX_TRANSPARENT`.
#![allow(clippy::too_many_arguments)]

use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use pressure_core::{FocusToken, Key, PlatformShell, Point};
use windows::Win32::Foundation::{
    BOOL, COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM,
};
use windows::Win32::Graphics::Dwm::{DWMWA_USE_IMMERSIVE_DARK_MODE, DwmSetWindowAttribute};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION, CreateCompatibleDC, CreateDIBSection,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, HBITMAP, HDC, ReleaseDC, SelectObject,
    SetDIBits,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Registry::{HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RegGetValueW};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VK_ESCAPE, VK_LBUTTON, VK_RETURN,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateIcon, CreateWindowExW, DefWindowProcW, DestroyIcon,
    DestroyWindow, DispatchMessageW, GWL_EXSTYLE, GetCursorPos, GetForegroundWindow,
    GetSystemMetrics, HICON, HTCLIENT, HWND_TOPMOST, IDC_ARROW, LoadCursorW, MB_ICONERROR, MB_OK,
    MSG, MessageBoxW, PM_REMOVE, PeekMessageW, RegisterClassExW, SM_CXSCREEN, SM_CYSCREEN,
    SW_SHOWNOACTIVATE, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SendMessageW, SetForegroundWindow,
    SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage, ULW_ALPHA,
    UpdateLayeredWindow, WM_CLOSE, WM_ERASEBKGND, WM_KEYDOWN, WM_NCHITTEST, WM_QUIT, WM_SETICON,
    WM_SETTINGCHANGE, WNDCLASSEXW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::{PCWSTR, w};

use super::{OverlayConfig, OverlayPlatform, PlatformError, PointerState};

const CLASS_NAME: &str = "PressureOverlayClass";
const ERROR_CLASS_ALREADY_EXISTS: i32 = 1410;
const ICON_SMALL: usize = 0;
const ICON_BIG: usize = 1;
const ICON_SIZE: i32 = 16;

/// Set by the window procedure when the user theme changes
static THEME_CHANGED: AtomicBool = AtomicBool::new(false);
/// Set by the window procedure on WM_CLOSE (e.g. Alt+F4)
static CLOSE_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Windows overlay implementation
pub struct WindowsOverlay {
    hwnd: HWND,
    hdc_mem: HDC,
    hbitmap: HBITMAP,
    icon: Option<HICON>,
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    pixel_data: Vec<u8>,
    bgra_buffer: Vec<u8>, // Pre-allocated buffer for RGBA->BGRA conversion
    content_dirty: bool,  // Track if pixel content or opacity changed
    opacity: f32,
    click_through: bool,
    pending_keys: Vec<Key>,
    running: bool,
}

// NOTE: WindowsOverlay intentionally does NOT implement Send.
// Win32 HWND handles must be used from the thread that created them.

impl WindowsOverlay {
    fn register_class() -> Result<(), PlatformError> {
        unsafe {
            let class_name = wide_string(CLASS_NAME);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            let wc = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };

            if RegisterClassExW(&wc) == 0 {
                // Class may already be registered, which is fine
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(ERROR_CLASS_ALREADY_EXISTS) {
                    return Err(PlatformError::Other(format!(
                        "RegisterClassExW failed: {}",
                        err
                    )));
                }
            }
        }
        Ok(())
    }

    fn bitmap_info(&self) -> BITMAPINFO {
        BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: self.width as i32,
                biHeight: -(self.height as i32), // Top-down DIB
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn create_dib_section(&mut self) -> Result<(), PlatformError> {
        unsafe {
            let hdc_screen = GetDC(HWND::default());

            if !self.hdc_mem.is_invalid() {
                let _ = DeleteDC(self.hdc_mem);
            }
            if !self.hbitmap.is_invalid() {
                let _ = DeleteObject(self.hbitmap);
            }

            self.hdc_mem = CreateCompatibleDC(hdc_screen);
            if self.hdc_mem.is_invalid() {
                ReleaseDC(HWND::default(), hdc_screen);
                return Err(PlatformError::BufferError(
                    "CreateCompatibleDC failed".to_string(),
                ));
            }

            let bmi = self.bitmap_info();
            let mut bits: *mut c_void = ptr::null_mut();
            let created = CreateDIBSection(hdc_screen, &bmi, DIB_RGB_COLORS, &mut bits, None, 0);
            ReleaseDC(HWND::default(), hdc_screen);
            self.hbitmap = created.map_err(|e| {
                PlatformError::BufferError(format!("CreateDIBSection failed: {}", e))
            })?;
            SelectObject(self.hdc_mem, self.hbitmap);

            let size = (self.width * self.height * 4) as usize;
            self.pixel_data.resize(size, 0);
            self.bgra_buffer.resize(size, 0);
            self.content_dirty = true;
        }
        Ok(())
    }

    fn update_layered_window(&mut self) {
        // Skip expensive pixel operations if nothing changed
        if !self.content_dirty {
            return;
        }
        self.content_dirty = false;

        // RGBA -> BGRA, both premultiplied
        for (dst, src) in self
            .bgra_buffer
            .chunks_exact_mut(4)
            .zip(self.pixel_data.chunks_exact(4))
        {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }

        let bmi = self.bitmap_info();
        unsafe {
            let hdc_screen = GetDC(HWND::default());
            SetDIBits(
                self.hdc_mem,
                self.hbitmap,
                0,
                self.height,
                self.bgra_buffer.as_ptr() as *const _,
                &bmi,
                DIB_RGB_COLORS,
            );

            let pt_src = POINT { x: 0, y: 0 };
            let pt_dst = POINT {
                x: self.x,
                y: self.y,
            };
            let size = SIZE {
                cx: self.width as i32,
                cy: self.height as i32,
            };
            let blend = BLENDFUNCTION {
                BlendOp: 0, // AC_SRC_OVER
                BlendFlags: 0,
                SourceConstantAlpha: (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
                AlphaFormat: 1, // AC_SRC_ALPHA
            };

            let _ = UpdateLayeredWindow(
                self.hwnd,
                hdc_screen,
                Some(&pt_dst),
                Some(&size),
                self.hdc_mem,
                Some(&pt_src),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            ReleaseDC(HWND::default(), hdc_screen);
        }
    }

    fn extended_style(click_through: bool) -> u32 {
        let mut ex_style = WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW;
        if click_through {
            ex_style |= WS_EX_TRANSPARENT | WS_EX_NOACTIVATE;
        }
        ex_style.0
    }

    fn translate_key(vk: u16) -> Option<Key> {
        match vk {
            v if v == VK_RETURN.0 => Some(Key::Return),
            v if v == VK_ESCAPE.0 => Some(Key::Escape),
            0x30..=0x39 | 0x41..=0x5A => Some(Key::Char((vk as u8 as char).to_ascii_lowercase())),
            _ => None,
        }
    }
}

impl OverlayPlatform for WindowsOverlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Self::register_class()?;

        let (x, y) = unsafe {
            config.position_on(
                GetSystemMetrics(SM_CXSCREEN).max(0) as u32,
                GetSystemMetrics(SM_CYSCREEN).max(0) as u32,
            )
        };

        let hwnd = unsafe {
            let class_name = wide_string(CLASS_NAME);
            let window_name = wide_string(&config.namespace);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            let ex_style = windows::Win32::UI::WindowsAndMessaging::WINDOW_EX_STYLE(
                Self::extended_style(config.click_through),
            );

            CreateWindowExW(
                ex_style,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(window_name.as_ptr()),
                WS_POPUP,
                x,
                y,
                config.width as i32,
                config.height as i32,
                None,
                None,
                hinstance,
                None,
            )
            .map_err(|e| PlatformError::Other(format!("CreateWindowExW failed: {}", e)))?
        };

        let mut overlay = Self {
            hwnd,
            hdc_mem: HDC::default(),
            hbitmap: HBITMAP::default(),
            icon: None,
            width: config.width,
            height: config.height,
            x,
            y,
            pixel_data: vec![0u8; (config.width * config.height * 4) as usize],
            bgra_buffer: vec![0u8; (config.width * config.height * 4) as usize],
            content_dirty: true,
            opacity: 1.0,
            click_through: config.click_through,
            pending_keys: Vec::new(),
            running: true,
        };

        overlay.create_dib_section()?;

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
        }
        tracing::debug!(?hwnd, x, y, width = config.width, height = config.height, "Win32 overlay created");

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
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;

        if let Err(e) = self.create_dib_section() {
            tracing::error!(error = %e, "Failed to resize layered window buffer");
        }

        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                width as i32,
                height as i32,
                SWP_NOMOVE | SWP_NOACTIVATE,
            );
        }
    }

    fn set_opacity(&mut self, opacity: f32) {
        if opacity != self.opacity {
            self.opacity = opacity;
            self.content_dirty = true;
        }
    }

    fn set_click_through(&mut self, enabled: bool) {
        self.click_through = enabled;
        unsafe {
            SetWindowLongPtrW(
                self.hwnd,
                GWL_EXSTYLE,
                Self::extended_style(enabled) as isize,
            );
        }
    }

    fn is_interactive(&self) -> bool {
        !self.click_through
    }

    fn pointer(&self) -> Option<PointerState> {
        let mut pt = POINT::default();
        unsafe {
            GetCursorPos(&mut pt).ok()?;
            Some(PointerState {
                position: Point::new(pt.x, pt.y),
                // High bit set while the button is held
                left_down: GetAsyncKeyState(VK_LBUTTON.0 as i32) < 0,
            })
        }
    }

    fn take_key_events(&mut self) -> Vec<Key> {
        mem::take(&mut self.pending_keys)
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        self.content_dirty = true; // Assume caller will modify the buffer
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        self.update_layered_window();
    }

    fn poll_events(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                match msg.message {
                    WM_QUIT => {
                        self.running = false;
                        return false;
                    }
                    WM_KEYDOWN => {
                        if let Some(key) = Self::translate_key(msg.wParam.0 as u16) {
                            self.pending_keys.push(key);
                        }
                    }
                    _ => {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
        if CLOSE_REQUESTED.swap(false, Ordering::Relaxed) {
            tracing::debug!("Close requested");
            self.running = false;
        }
        self.running
    }
}

impl PlatformShell for WindowsOverlay {
    fn is_light_mode(&self) -> bool {
        let mut value: u32 = 1;
        let mut size = mem::size_of::<u32>() as u32;
        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                w!("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize"),
                w!("AppsUseLightTheme"),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut value as *mut u32 as *mut c_void),
                Some(&mut size),
            )
        };
        // Missing key: Windows default is light
        !status.is_ok() || value != 0
    }

    fn set_dark_mode(&mut self, dark: bool) {
        let value = BOOL::from(dark);
        unsafe {
            if let Err(e) = DwmSetWindowAttribute(
                self.hwnd,
                DWMWA_USE_IMMERSIVE_DARK_MODE,
                &value as *const BOOL as *const c_void,
                mem::size_of::<BOOL>() as u32,
            ) {
                tracing::debug!(error = %e, "DwmSetWindowAttribute failed");
            }
        }
    }

    fn notify_icon_update(&mut self, inverted: bool) {
        let (fill, border) = if inverted {
            ([0x17, 0x17, 0x17, 0xff], [0xf0, 0xf0, 0xf0, 0xff])
        } else {
            ([0xff, 0xff, 0xff, 0xff], [0x0a, 0x0a, 0x0a, 0xff])
        };
        // 32bpp BGRA colour plane plus an all-zero (opaque) AND mask
        let mut color = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
        for y in 0..ICON_SIZE {
            for x in 0..ICON_SIZE {
                let edge = x == 0 || y == 0 || x == ICON_SIZE - 1 || y == ICON_SIZE - 1;
                color.extend_from_slice(if edge { &border } else { &fill });
            }
        }
        let and_mask = vec![0u8; (ICON_SIZE * ICON_SIZE / 8) as usize];

        unsafe {
            let Ok(hinstance) = GetModuleHandleW(None) else {
                return;
            };
            let icon = match CreateIcon(
                HINSTANCE::from(hinstance),
                ICON_SIZE,
                ICON_SIZE,
                1,
                32,
                and_mask.as_ptr(),
                color.as_ptr(),
            ) {
                Ok(icon) => icon,
                Err(e) => {
                    tracing::debug!(error = %e, "CreateIcon failed");
                    return;
                }
            };
            for kind in [ICON_SMALL, ICON_BIG] {
                SendMessageW(
                    self.hwnd,
                    WM_SETICON,
                    WPARAM(kind),
                    LPARAM(icon.0 as isize),
                );
            }
            if let Some(old) = self.icon.replace(icon) {
                let _ = DestroyIcon(old);
            }
        }
    }

    fn focused_window(&self) -> Option<FocusToken> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_invalid() || hwnd == self.hwnd {
            return None;
        }
        Some(FocusToken(hwnd.0 as usize as u64))
    }

    fn focus_self(&mut self) {
        unsafe {
            let _ = SetForegroundWindow(self.hwnd);
        }
    }

    fn restore_focus(&mut self, token: FocusToken) {
        let hwnd = HWND(token.0 as usize as *mut c_void);
        unsafe {
            let _ = SetForegroundWindow(hwnd);
        }
    }

    fn take_theme_changed(&mut self) -> bool {
        THEME_CHANGED.swap(false, Ordering::Relaxed)
    }
}

impl Drop for WindowsOverlay {
    fn drop(&mut self) {
        unsafe {
            if !self.hdc_mem.is_invalid() {
                let _ = DeleteDC(self.hdc_mem);
            }
            if !self.hbitmap.is_invalid() {
                let _ = DeleteObject(self.hbitmap);
            }
            if let Some(icon) = self.icon.take() {
                let _ = DestroyIcon(icon);
            }
            if !self.hwnd.is_invalid() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

/// Window procedure for overlay windows
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCHITTEST => LRESULT(HTCLIENT as isize),
        WM_ERASEBKGND => LRESULT(1), // Don't erase background
        WM_CLOSE => {
            // Destroyed on drop, not here
            CLOSE_REQUESTED.store(true, Ordering::Relaxed);
            LRESULT(0)
        }
        WM_SETTINGCHANGE => {
            if lparam.0 != 0 {
                // SAFETY: for WM_SETTINGCHANGE a non-null lParam is a
                // null-terminated wide string naming the changed area
                let area = unsafe { PCWSTR(lparam.0 as *const u16).to_string() };
                if area.is_ok_and(|area| area == "ImmersiveColorSet") {
                    THEME_CHANGED.store(true, Ordering::Relaxed);
                }
            }
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Blocking error dialog
pub fn message_box(title: &str, message: &str) {
    let title = wide_string(title);
    let message = wide_string(message);
    unsafe {
        MessageBoxW(
            HWND::default(),
            PCWSTR(message.as_ptr()),
            PCWSTR(title.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

/// Convert a &str to a null-terminated wide string
fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
