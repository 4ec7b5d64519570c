//! Statement execution: the per-category block dispatcher and the slice
//! executor that drives one script thread until its first suspension.
//!
//! A statement block resolves to one of three outcomes: **completed**
//! (the slice advances), **suspended** (a wait was recorded on the
//! thread state and the slice ends), or **failed** (a `ScriptError`
//! carrying the block coordinates; the thread terminates, every other
//! thread keeps running). Suspension is data on the thread state, never
//! a stack unwind.

pub mod dispatcher;
mod executor;

pub use dispatcher::{ExecOutcome, execute_block};
pub use executor::{SliceResult, run_slice};
