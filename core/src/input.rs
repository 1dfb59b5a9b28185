//! User commands and the key gestures that produce them

/// Keys the widget reacts to while it holds focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Return,
    Escape,
}

/// Commands delivered into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    EnterResizeMode,
    ToggleInvert,
}

impl Command {
    /// Command bound to a key, if any. `Return` is the resize accept key and
    /// maps to no command.
    pub fn for_key(key: Key) -> Option<Self> {
        match key {
            Key::Escape => Some(Command::Exit),
            Key::Char(c) => match c.to_ascii_lowercase() {
                'q' => Some(Command::Exit),
                'r' => Some(Command::EnterResizeMode),
                'i' => Some(Command::ToggleInvert),
                _ => None,
            },
            Key::Return => None,
        }
    }
}
