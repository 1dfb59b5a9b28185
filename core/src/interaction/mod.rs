//! Lock, hover, drag and resize handling for the countdown widget
//!
//! The widget starts locked and click-through at a low opacity. Resting the
//! pointer on it for the hover threshold unlocks it; once unlocked it can be
//! dragged. Resize mode is entered only by command and left only by a confirm
//! gesture.

mod machine;


pub use machine::{
    ASPECT, BASE_HEIGHT, BASE_POINT_SIZE, BASE_WIDTH, Effect, InteractionConfig,
    InteractionState, MAX_RESIZE_HEIGHT, MIN_RESIZE_HEIGHT, Mode, OPACITY_EPSILON, TickInput,
    TickOutcome, tick,
};
