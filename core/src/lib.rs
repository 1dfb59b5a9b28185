pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod serde_defaults;
pub mod shell;

use std::time::Duration;

/// Scheduler cadence; hover thresholds are expressed in these ticks
pub const TICKS_PER_SECOND: u32 = 100;
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

// Re-exports for convenience
pub use clock::{CountdownFormat, Remaining, format_countdown, next_target, remaining_secs};
pub use config::AppConfig;
pub use error::ConfigError;
pub use geometry::{Point, Rect, Size};
pub use input::{Command, Key};
pub use interaction::{
    Effect, InteractionConfig, InteractionState, Mode, TickInput, TickOutcome, tick,
};
pub use shell::{FocusToken, PlatformShell};
