//! Authored program model: the block/script tree, the project JSON
//! document, and the structured script error type.
//!
//! Everything in this crate is immutable after load. Live state (entity
//! transforms, thread states, variable values) lives in `core-state`;
//! the scripts here are shared into the runtime behind `Arc` and never
//! mutated.

mod block;
mod error;
mod project;
mod script_parse;

pub use block::{Block, ParamValue, Script};
pub use error::ScriptError;
pub use project::{
    Costume, EntityInit, ObjectInfo, ObjectType, ProjectDocument, ProjectError, SceneInfo,
    SoundFile, SpecialConfig, TextStyle, VariableDef, VariableKind, VariableScope,
};
pub use script_parse::parse_script_source;
