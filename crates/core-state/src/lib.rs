//! Live runtime state.
//!
//! `World` is the single mutable aggregate every block handler operates
//! on: the entity registry with its draw order, the variable store, the
//! scene/mouse/key/timer state, and the owned audio/clock backends. The
//! scheduler in `core-engine` drives slices against it; the compositor
//! reads it between ticks. One lock around the whole aggregate (taken by
//! the embedder) is the concurrency story — nothing in here is shared
//! piecemeal.

mod entity;
mod thread;
mod vars;
mod world;

pub use entity::{
    CollisionSide, Dialog, DialogKind, Effects, Entity, PenKind, PenState, RotationField,
    RotationMethod, TimedMove, TimedMoveToObject, TimedRotation, normalize_degrees,
};
pub use thread::{ScriptThreadState, ThreadId, WaitKind, WaitState};
pub use vars::{CloudMirror, VarEntry, VariableStore};
pub use world::{Mouse, PenLine, ProjectTimer, SceneRequest, SoundState, World};
