use crate::geometry::{Point, Rect, Size};
use crate::input::Command;

/// Window size and font size the widget is designed around
pub const BASE_WIDTH: u32 = 320;
pub const BASE_HEIGHT: u32 = 100;
pub const BASE_POINT_SIZE: u32 = 52;

/// Height over width while resizing
pub const ASPECT: f32 = BASE_HEIGHT as f32 / BASE_WIDTH as f32;

pub const MIN_RESIZE_HEIGHT: i32 = 40;
pub const MAX_RESIZE_HEIGHT: i32 = 600;

pub const OPACITY_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionConfig {
    pub hover_threshold_ticks: u32,
    pub fade_rate: f32,
    pub passive_alpha: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_threshold_ticks: 100,
            fade_rate: 0.05,
            passive_alpha: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Click-through, faded
    Locked,
    /// Opaque and focusable, accepts drags and key commands
    Unlocked,
    /// Following the pointer; `grab` is the pointer offset from the window origin
    Dragging { grab: Point },
    /// Height tracks the pointer until a confirm gesture
    Resizing,
}

impl Mode {
    pub fn is_locked(&self) -> bool {
        matches!(self, Mode::Locked)
    }

    /// Unlocked or dragging: the states in which key commands are honoured
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Mode::Unlocked | Mode::Dragging { .. })
    }
}

/// Everything the widget remembers between ticks
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub mode: Mode,
    pub hover_ticks: u32,
    pub opacity: f32,
    pub window: Rect,
    /// Countdown text last shown; frozen while resizing
    pub countdown: String,
    focus_taken: bool,
}

impl InteractionState {
    pub fn new(config: &InteractionConfig, window: Rect) -> Self {
        Self {
            mode: Mode::Locked,
            hover_ticks: 0,
            opacity: config.passive_alpha,
            window,
            countdown: String::new(),
            focus_taken: false,
        }
    }

    /// Whether the widget took input focus that has not been handed back yet
    pub fn holds_focus(&self) -> bool {
        self.focus_taken
    }
}

/// Per-tick observations of the pointer, window and keyboard
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub pointer: Point,
    pub window: Rect,
    pub left_pressed: bool,
    pub left_released: bool,
    /// Resize accept key pressed this tick
    pub accept: bool,
    pub commands: &'a [Command],
    pub countdown: &'a str,
}

/// Side effects the caller must carry out, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Remember the focused window, then focus the widget
    RequestFocus,
    /// Hand focus back to the remembered window
    RestoreFocus,
    MoveWindow(Point),
    ResizeWindow(Size),
    RebuildAtlas { point_size: u32 },
    ToggleInvert,
    Exit,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Something visible changed and the frame must be redrawn
    pub dirty: bool,
    pub effects: Vec<Effect>,
}

impl TickOutcome {
    fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn wants_exit(&self) -> bool {
        self.effects.contains(&Effect::Exit)
    }
}

/// Advance the state machine by one tick.
///
/// Order: window sync, commands, buttons (drag/resize), hover, opacity,
/// countdown text. `state.window` is kept in step with the move/resize
/// effects emitted here.
pub fn tick(
    state: &mut InteractionState,
    config: &InteractionConfig,
    input: &TickInput<'_>,
) -> TickOutcome {
    let mut out = TickOutcome::default();
    state.window = input.window;

    for command in input.commands {
        apply_command(state, *command, &mut out);
    }

    if state.mode == Mode::Resizing {
        if input.left_pressed || input.accept {
            confirm_resize(state, &mut out);
        } else {
            track_resize(state, input.pointer, &mut out);
        }
    } else {
        handle_drag(state, input, &mut out);
    }

    if state.mode != Mode::Resizing {
        handle_hover(state, config, input.pointer, &mut out);
    }

    step_opacity(state, config, &mut out);

    if state.mode != Mode::Resizing && state.countdown != input.countdown {
        state.countdown.clear();
        state.countdown.push_str(input.countdown);
        out.dirty = true;
    }

    out
}

fn apply_command(state: &mut InteractionState, command: Command, out: &mut TickOutcome) {
    match command {
        Command::EnterResizeMode => {
            if state.mode != Mode::Resizing {
                tracing::debug!("Entering resize mode");
            }
            state.mode = Mode::Resizing;
            state.hover_ticks = 0;
            out.dirty = true;
        }
        Command::ToggleInvert => {
            out.push(Effect::ToggleInvert);
            out.dirty = true;
        }
        Command::Exit => out.push(Effect::Exit),
    }
}

fn handle_drag(state: &mut InteractionState, input: &TickInput<'_>, out: &mut TickOutcome) {
    if state.mode == Mode::Unlocked && input.left_pressed && state.window.contains(input.pointer)
    {
        let grab = input.pointer - state.window.origin();
        tracing::trace!(?grab, "Drag started");
        state.mode = Mode::Dragging { grab };
        out.dirty = true;
    }

    let Mode::Dragging { grab } = state.mode else {
        return;
    };

    if input.left_released {
        state.mode = Mode::Unlocked;
        out.dirty = true;
        return;
    }

    let origin = input.pointer - grab;
    if origin != state.window.origin() {
        state.window = state.window.with_origin(origin);
        out.push(Effect::MoveWindow(origin));
    }
}

fn track_resize(state: &mut InteractionState, pointer: Point, out: &mut TickOutcome) {
    let height = (pointer.y as i64 - state.window.y as i64)
        .unsigned_abs()
        .clamp(MIN_RESIZE_HEIGHT as u64, MAX_RESIZE_HEIGHT as u64) as u32;
    let width = (height as f32 / ASPECT) as u32;
    let size = Size::new(width, height);

    if size != state.window.size() {
        state.window = state.window.with_size(size);
        out.push(Effect::ResizeWindow(size));
    }
    out.dirty = true;
}

fn confirm_resize(state: &mut InteractionState, out: &mut TickOutcome) {
    let point_size = (BASE_POINT_SIZE as f32 * state.window.width as f32 / BASE_WIDTH as f32) as u32;
    tracing::debug!(width = state.window.width, point_size, "Resize confirmed");

    state.mode = Mode::Locked;
    state.hover_ticks = 0;
    out.push(Effect::RebuildAtlas { point_size });
    release_focus(state, out);
    out.dirty = true;
}

fn handle_hover(
    state: &mut InteractionState,
    config: &InteractionConfig,
    pointer: Point,
    out: &mut TickOutcome,
) {
    if state.window.contains(pointer) {
        state.hover_ticks = state.hover_ticks.saturating_add(1);
        if state.mode.is_locked() && state.hover_ticks >= config.hover_threshold_ticks {
            tracing::debug!(ticks = state.hover_ticks, "Unlocked by hover");
            state.mode = Mode::Unlocked;
            state.focus_taken = true;
            out.push(Effect::RequestFocus);
            out.dirty = true;
        }
        return;
    }

    if state.hover_ticks != 0 || !state.mode.is_locked() {
        if !state.mode.is_locked() {
            tracing::debug!("Pointer left, relocking");
        }
        state.mode = Mode::Locked;
        state.hover_ticks = 0;
        release_focus(state, out);
        out.dirty = true;
    }
}

fn release_focus(state: &mut InteractionState, out: &mut TickOutcome) {
    if state.focus_taken {
        state.focus_taken = false;
        out.push(Effect::RestoreFocus);
    }
}

fn step_opacity(state: &mut InteractionState, config: &InteractionConfig, out: &mut TickOutcome) {
    let target = if state.mode.is_locked() {
        config.passive_alpha
    } else {
        1.0
    };
    let gap = target - state.opacity;
    if gap.abs() > OPACITY_EPSILON {
        state.opacity = (state.opacity + gap * config.fade_rate).clamp(0.0, 1.0);
        out.dirty = true;
    }
}
