//! Desktop-shell capabilities the widget needs but does not own

/// Opaque handle to a top-level window that held input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusToken(pub u64);

/// Theme and focus plumbing provided by the host platform.
///
/// Backends that cannot do something (e.g. no theme notification on X11)
/// implement the operation as a no-op.
pub trait PlatformShell {
    /// Whether the desktop currently prefers a light theme
    fn is_light_mode(&self) -> bool;

    /// Apply a dark or light frame theme to the widget's own window
    fn set_dark_mode(&mut self, dark: bool);

    /// Refresh the window/tray icon after the colour scheme changed
    fn notify_icon_update(&mut self, inverted: bool);

    /// The currently focused top-level window, excluding the widget itself
    fn focused_window(&self) -> Option<FocusToken>;

    /// Give the widget's window input focus
    fn focus_self(&mut self);

    /// Hand focus back to a previously remembered window
    fn restore_focus(&mut self, token: FocusToken);

    /// Returns true once after the OS reported a theme change
    fn take_theme_changed(&mut self) -> bool;
}
