//! Event types shared between the host input feed, the world state, and
//! the engine's event bus.
//!
//! The host (window loop, or a test harness) produces [`InputEvent`]s;
//! the engine drains them once per tick, updates mouse/key state, and
//! dispatches matching scripts. Blocks that raise events mid-slice
//! (`message_cast`, clone creation) queue [`InternalEvent`]s on the
//! world, delivered at the start of the *next* tick.

mod keys;

pub use keys::{KeyCode, resolve_key_param};

/// External event produced by the host. Pointer coordinates are stage
/// coordinates (center origin, y-up); `on_stage` is false when the
/// pointer is outside the stage rect.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    PointerMove { x: f64, y: f64, on_stage: bool },
    PointerDown { x: f64, y: f64, on_stage: bool },
    PointerUp { x: f64, y: f64, on_stage: bool },
    /// Text submitted for an `ask_and_wait` prompt.
    TextSubmit(String),
    Quit,
}

/// Event raised by a running script, delivered next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    /// `message_cast`: fan out to every `when_message_cast` script with a
    /// matching message id.
    Message(String),
    /// A clone was created: fire the original's `when_clone_start`
    /// scripts on the clone entity.
    CloneStarted { clone_id: String },
}
