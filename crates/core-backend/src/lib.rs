//! Host-facing backend traits.
//!
//! The engine consumes a renderer, an audio device, and a clock but never
//! owns their implementations; the binary wires real backends, tests wire
//! the doubles in this crate. Everything here is deliberately thin: the
//! engine calls these at tick boundaries only, and observable semantics
//! never depend on what a backend does with the calls.

mod audio;
mod clock;
mod renderer;
mod stage;

pub use audio::{AudioBackend, AudioCall, NullAudio, RecordingAudio};
pub use clock::{Clock, ManualClock, SystemClock};
pub use renderer::{FlipState, NullRenderer, RendererBackend, StageRegion, TextureHandle};
pub use stage::{STAGE_HEIGHT, STAGE_WIDTH, StageSize, window_to_stage};
