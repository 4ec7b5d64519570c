//! Structured script execution error.

use thiserror::Error;

/// Error raised by a block whose parameters or runtime state make it
/// unexecutable. Carries the block coordinates so the engine can log
/// exactly which block of which object failed; the owning script thread
/// terminates, every other thread continues.
///
/// `human` is the editor-facing message (Korean, matching the editor's
/// own wording); `developer` is the log-facing detail.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{human} [object {object_id}, block {block_id} ({opcode})] {developer}")]
pub struct ScriptError {
    pub block_id: String,
    pub opcode: String,
    pub object_id: String,
    pub human: String,
    pub developer: String,
}

impl ScriptError {
    pub fn new(
        block_id: impl Into<String>,
        opcode: impl Into<String>,
        object_id: impl Into<String>,
        human: impl Into<String>,
        developer: impl Into<String>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            opcode: opcode.into(),
            object_id: object_id.into(),
            human: human.into(),
            developer: developer.into(),
        }
    }

    /// Division by zero in `calc_basic`. The human message is the
    /// editor's own wording and is load-bearing for dialog display.
    pub fn division_by_zero(block_id: &str, opcode: &str, object_id: &str) -> Self {
        Self::new(
            block_id,
            opcode,
            object_id,
            "0으로 나눌 수 없습니다",
            "division by zero",
        )
    }
}
