//! The countdown widget: one tick of input, state, effects and drawing

use chrono::{DateTime, TimeZone};
use pressure_core::{
    AppConfig, Command, CountdownFormat, Effect, FocusToken, InteractionConfig, InteractionState,
    Key, Mode, PlatformShell, TickInput, format_countdown, tick,
};

use crate::atlas::GlyphAtlas;
use crate::colors::ColorScheme;
use crate::compositor::Compositor;
use crate::font::GlyphSource;
use crate::manager::OverlayWindow;
use crate::platform::{OverlayPlatform, PointerState};

pub struct CountdownWidget<P, F>
where
    P: OverlayPlatform + PlatformShell,
    F: GlyphSource,
{
    window: OverlayWindow<P>,
    font: F,
    atlas: GlyphAtlas,
    compositor: Compositor,
    state: InteractionState,
    config: InteractionConfig,
    show_seconds: bool,
    light_mode: bool,
    scheme: ColorScheme,
    was_left_down: bool,
    /// Reused on ticks where the pointer cannot be queried
    last_pointer: PointerState,
    /// Window that held focus before the widget took it
    remembered_focus: Option<FocusToken>,
    force_redraw: bool,
}

impl<P, F> CountdownWidget<P, F>
where
    P: OverlayPlatform + PlatformShell,
    F: GlyphSource,
{
    pub fn new(mut window: OverlayWindow<P>, mut font: F, config: &AppConfig) -> Self {
        let interaction = config.interaction();

        let light_mode = window.platform().is_light_mode();
        let scheme = ColorScheme::for_light_mode(light_mode);
        window.platform_mut().set_dark_mode(!light_mode);
        window.platform_mut().notify_icon_update(scheme.is_inverted());

        let mut atlas = GlyphAtlas::new();
        atlas.rebuild(Some(&mut font), scheme);

        window.set_click_through(true);
        window.set_opacity(interaction.passive_alpha);
        let state = InteractionState::new(&interaction, window.rect());

        tracing::info!(
            light_mode,
            hover_ticks = interaction.hover_threshold_ticks,
            fade_rate = interaction.fade_rate,
            passive_alpha = interaction.passive_alpha,
            "Countdown widget ready"
        );

        Self {
            window,
            font,
            atlas,
            compositor: Compositor::new(config.fit_margin),
            state,
            config: interaction,
            show_seconds: config.show_seconds,
            light_mode,
            scheme,
            was_left_down: false,
            last_pointer: PointerState::default(),
            remembered_focus: None,
            force_redraw: true,
        }
    }

    /// Run one tick at `now`. Returns false once the widget should close.
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        if !self.window.poll_events() {
            tracing::debug!("Window closed");
            return false;
        }
        if self.window.platform_mut().take_theme_changed() {
            self.sync_theme();
        }

        let (commands, accept) = self.read_keys();

        let pointer = match self.window.pointer() {
            Some(pointer) => {
                self.last_pointer = pointer;
                pointer
            }
            None => {
                tracing::trace!("Pointer unavailable, holding last position");
                self.last_pointer
            }
        };
        let left_pressed = pointer.left_down && !self.was_left_down;
        let left_released = !pointer.left_down && self.was_left_down;
        self.was_left_down = pointer.left_down;

        let countdown = format_countdown(
            now,
            CountdownFormat {
                show_seconds: self.show_seconds,
                has_colon: self.atlas.has_colon(),
            },
        );

        let input = TickInput {
            pointer: pointer.position,
            window: self.window.rect(),
            left_pressed,
            left_released,
            accept,
            commands: &commands,
            countdown: &countdown,
        };
        let outcome = tick(&mut self.state, &self.config, &input);

        for effect in outcome.effects {
            if !self.apply(effect) {
                return false;
            }
        }

        let locked = self.state.mode.is_locked();
        if self.window.is_interactive() == locked {
            self.window.set_click_through(locked);
        }

        if outcome.dirty || self.force_redraw {
            self.compositor.present(
                &mut self.window,
                &self.atlas,
                &self.state.countdown,
                self.state.mode == Mode::Resizing,
                self.state.opacity,
            );
            self.force_redraw = false;
        }
        true
    }

    /// Commands from keys, and whether the resize accept key was pressed
    fn read_keys(&mut self) -> (Vec<Command>, bool) {
        let mut commands = Vec::new();
        let mut accept = false;
        for key in self.window.take_key_events() {
            if key == Key::Return && self.state.mode == Mode::Resizing {
                accept = true;
            } else if self.state.mode.accepts_commands() {
                commands.extend(Command::for_key(key));
            }
        }
        (commands, accept)
    }

    fn apply(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::RequestFocus => {
                self.remembered_focus = self.window.platform().focused_window();
                self.window.set_click_through(false);
                self.window.platform_mut().focus_self();
            }
            Effect::RestoreFocus => {
                if let Some(token) = self.remembered_focus.take() {
                    self.window.platform_mut().restore_focus(token);
                }
            }
            Effect::MoveWindow(origin) => self.window.set_position(origin.x, origin.y),
            Effect::ResizeWindow(size) => self.window.set_size(size.width, size.height),
            Effect::RebuildAtlas { point_size } => {
                self.font.set_point_size(point_size);
                self.atlas.rebuild(Some(&mut self.font), self.scheme);
            }
            Effect::ToggleInvert => {
                self.scheme = self.scheme.toggled();
                tracing::debug!(scheme = ?self.scheme, "Colours inverted");
                self.atlas.rebuild(Some(&mut self.font), self.scheme);
                let shell = self.window.platform_mut();
                shell.set_dark_mode(!self.scheme.is_inverted());
                shell.notify_icon_update(self.scheme.is_inverted());
            }
            Effect::Exit => {
                tracing::info!("Exit requested");
                return false;
            }
        }
        true
    }

    /// Follow an OS light/dark switch
    fn sync_theme(&mut self) {
        let light_mode = self.window.platform().is_light_mode();
        if light_mode == self.light_mode {
            return;
        }
        tracing::info!(light_mode, "Desktop theme changed");
        self.light_mode = light_mode;
        self.scheme = ColorScheme::for_light_mode(light_mode);

        let shell = self.window.platform_mut();
        shell.set_dark_mode(!light_mode);
        shell.notify_icon_update(self.scheme.is_inverted());

        self.atlas.rebuild(Some(&mut self.font), self.scheme);
        self.force_redraw = true;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn font(&self) -> &F {
        &self.font
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn window(&self) -> &OverlayWindow<P> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut OverlayWindow<P> {
        &mut self.window
    }
}

impl<P, F> Drop for CountdownWidget<P, F>
where
    P: OverlayPlatform + PlatformShell,
    F: GlyphSource,
{
    fn drop(&mut self) {
        self.atlas.clear();
        tracing::debug!("Countdown widget released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BlockGlyphs;
    use crate::platform::OverlayConfig;
    use crate::platform::headless::{HeadlessOverlay, OTHER_WINDOW};
    use chrono::{FixedOffset, NaiveDate};
    use pressure_core::Point;

    type TestWidget = CountdownWidget<HeadlessOverlay, BlockGlyphs>;

    /// Wednesday 2024-05-29 12:00:00 +02:00
    fn now() -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(2024, 5, 29)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(FixedOffset::east_opt(2 * 3600).unwrap())
            .unwrap()
    }

    fn widget_with(light_mode: bool) -> TestWidget {
        let mut platform = HeadlessOverlay::new(OverlayConfig::default()).unwrap();
        platform.light_mode = light_mode;
        let config = AppConfig {
            hover_threshold: 0.02,
            ..AppConfig::default()
        };
        CountdownWidget::new(
            OverlayWindow::from_platform(platform),
            BlockGlyphs::new(52),
            &config,
        )
    }

    fn widget() -> TestWidget {
        widget_with(false)
    }

    fn platform(widget: &mut TestWidget) -> &mut HeadlessOverlay {
        widget.window_mut().platform_mut()
    }

    fn point_at(widget: &mut TestWidget, x: i32, y: i32) {
        platform(widget).pointer.position = Point::new(x, y);
    }

    /// Hover inside until unlocked
    fn unlock(widget: &mut TestWidget) {
        point_at(widget, 810, 500);
        for _ in 0..2 {
            assert!(widget.tick(&now()));
        }
        assert_eq!(widget.state().mode, Mode::Unlocked);
    }

    #[test]
    fn test_startup_themes_and_builds_atlas() {
        let mut widget = widget();
        assert_eq!(widget.atlas().generation(), 1);
        assert_eq!(widget.scheme(), ColorScheme::Normal);
        assert_eq!(platform(&mut widget).dark_mode_calls, vec![true]);
        assert_eq!(platform(&mut widget).icon_updates, vec![false]);
        assert!(platform(&mut widget).click_through);
    }

    #[test]
    fn test_light_desktop_starts_inverted() {
        let widget = widget_with(true);
        assert_eq!(widget.scheme(), ColorScheme::Inverted);
    }

    #[test]
    fn test_first_tick_fits_window_to_text() {
        let mut widget = widget();
        point_at(&mut widget, 0, 0);
        assert!(widget.tick(&now()));

        assert_eq!(widget.state().countdown, "2:12:00:00");
        let platform = platform(&mut widget);
        // Ten 26x52 block glyphs
        assert_eq!((platform.width, platform.height), (260, 52));
        assert_eq!((platform.x, platform.y), (800, 490));
        assert_eq!(platform.commits, 1);
    }

    #[test]
    fn test_idle_tick_does_not_redraw() {
        let mut widget = widget();
        point_at(&mut widget, 0, 0);
        // Let the fade settle; passive alpha is the start value
        widget.tick(&now());
        let commits = platform(&mut widget).commits;
        widget.tick(&now());
        assert_eq!(platform(&mut widget).commits, commits);
    }

    #[test]
    fn test_unlock_takes_and_restores_focus() {
        let mut widget = widget();
        unlock(&mut widget);
        assert!(!platform(&mut widget).click_through);
        assert_eq!(platform(&mut widget).focused, None);

        point_at(&mut widget, 0, 0);
        assert!(widget.tick(&now()));
        assert_eq!(widget.state().mode, Mode::Locked);
        assert!(platform(&mut widget).click_through);
        assert_eq!(platform(&mut widget).restored, vec![OTHER_WINDOW]);
    }

    #[test]
    fn test_resize_confirm_rebuilds_once_at_new_size() {
        let mut widget = widget();
        unlock(&mut widget);

        platform(&mut widget).keys.push(Key::Char('r'));
        assert!(widget.tick(&now()));
        assert_eq!(widget.state().mode, Mode::Resizing);

        // 200px below the window top: 640x200
        point_at(&mut widget, 810, 690);
        assert!(widget.tick(&now()));
        assert_eq!(
            (platform(&mut widget).width, platform(&mut widget).height),
            (640, 200)
        );
        assert_eq!(platform(&mut widget).pixel(0, 0), [100, 100, 100, 255]);

        let generation = widget.atlas().generation();
        platform(&mut widget).pointer.left_down = true;
        assert!(widget.tick(&now()));

        assert_eq!(widget.atlas().generation(), generation + 1);
        assert_eq!(widget.font().point_size, 104);
        assert_eq!(widget.state().mode, Mode::Locked);
        assert_eq!(platform(&mut widget).restored, vec![OTHER_WINDOW]);
    }

    #[test]
    fn test_return_accepts_resize() {
        let mut widget = widget();
        unlock(&mut widget);
        platform(&mut widget).keys.push(Key::Char('r'));
        widget.tick(&now());

        platform(&mut widget).keys.push(Key::Return);
        assert!(widget.tick(&now()));
        assert_eq!(widget.state().mode, Mode::Locked);
        // Pointer 10px below the top clamps to 40px high, 128 wide
        assert_eq!(widget.font().point_size, 52 * 128 / 320);
    }

    #[test]
    fn test_invert_key_toggles_scheme() {
        let mut widget = widget();
        unlock(&mut widget);
        platform(&mut widget).keys.push(Key::Char('i'));
        assert!(widget.tick(&now()));

        assert_eq!(widget.scheme(), ColorScheme::Inverted);
        assert_eq!(widget.atlas().generation(), 2);
        assert_eq!(platform(&mut widget).icon_updates, vec![false, true]);
        assert_eq!(platform(&mut widget).dark_mode_calls, vec![true, false]);

        // Inverting back restores the dark window theme
        platform(&mut widget).keys.push(Key::Char('i'));
        assert!(widget.tick(&now()));
        assert_eq!(widget.scheme(), ColorScheme::Normal);
        assert_eq!(platform(&mut widget).dark_mode_calls, vec![true, false, true]);
    }

    #[test]
    fn test_lost_pointer_holds_drag_in_place() {
        let mut widget = widget();
        unlock(&mut widget);

        platform(&mut widget).pointer.left_down = true;
        assert!(widget.tick(&now()));
        assert!(matches!(widget.state().mode, Mode::Dragging { .. }));
        let origin = widget.window().rect().origin();

        platform(&mut widget).pointer_lost = true;
        platform(&mut widget).pointer.position = Point::new(i32::MIN, i32::MIN);
        for _ in 0..3 {
            assert!(widget.tick(&now()));
        }
        assert!(matches!(widget.state().mode, Mode::Dragging { .. }));
        assert_eq!(widget.window().rect().origin(), origin);

        // Pointer back: the drag follows it again
        platform(&mut widget).pointer_lost = false;
        platform(&mut widget).pointer.position = Point::new(830, 510);
        assert!(widget.tick(&now()));
        assert_eq!(
            widget.window().rect().origin(),
            Point::new(origin.x + 20, origin.y + 10)
        );
    }

    #[test]
    fn test_keys_ignored_while_locked() {
        let mut widget = widget();
        point_at(&mut widget, 0, 0);
        platform(&mut widget).keys.push(Key::Char('q'));
        assert!(widget.tick(&now()));
        assert!(platform(&mut widget).keys.is_empty());
    }

    #[test]
    fn test_exit_key_stops_widget() {
        let mut widget = widget();
        unlock(&mut widget);
        platform(&mut widget).keys.push(Key::Escape);
        assert!(!widget.tick(&now()));
    }

    #[test]
    fn test_theme_change_rethemes() {
        let mut widget = widget();
        platform(&mut widget).light_mode = true;
        platform(&mut widget).theme_changed = true;
        point_at(&mut widget, 0, 0);
        assert!(widget.tick(&now()));

        assert_eq!(widget.scheme(), ColorScheme::Inverted);
        assert_eq!(widget.atlas().generation(), 2);
        assert_eq!(platform(&mut widget).dark_mode_calls, vec![true, false]);
        assert_eq!(platform(&mut widget).icon_updates, vec![false, true]);
    }

    #[test]
    fn test_theme_notification_without_change_is_ignored() {
        let mut widget = widget();
        platform(&mut widget).theme_changed = true;
        widget.tick(&now());
        assert_eq!(widget.atlas().generation(), 1);
    }

    #[test]
    fn test_closed_window_stops_widget() {
        let mut widget = widget();
        platform(&mut widget).running = false;
        assert!(!widget.tick(&now()));
    }
}
