//! Per-script-invocation execution context.

use std::sync::Arc;

use core_model::Script;

/// Thread identity. Allocated from a single monotonically increasing
/// world counter, so ordering thread ids *is* ordering by dispatch
/// sequence — the scheduler's intra-entity contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

/// What a suspended thread is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitKind {
    /// `wait_second`: cleared when the clock passes `end_ms`.
    ExplicitSecond,
    /// One-tick suspension set by loop and timed blocks so re-entry
    /// happens next frame. `end_ms` is the current tick's timestamp.
    BlockInternal,
    /// Cleared when the audio backend stops reporting the sound playing.
    SoundFinish { sound_id: String },
    /// `ask_and_wait`: cleared by text submission.
    TextInput,
}

impl WaitKind {
    /// Whether clearing this wait resumes *after* the suspending block.
    ///
    /// Explicit waits (timer, sound, text input) complete their block's
    /// action at suspension time, so execution continues past it.
    /// Block-internal waits re-enter the same block: loops and timed
    /// moves poll their own progress on every re-entry.
    pub fn advances_resume(&self) -> bool {
        !matches!(self, WaitKind::BlockInternal)
    }
}

/// Active wait on a thread. `block_id` names the suspending block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitState {
    pub kind: WaitKind,
    pub end_ms: u64,
    pub block_id: String,
}

/// Execution state of one dispatched script.
#[derive(Debug, Clone)]
pub struct ScriptThreadState {
    /// The script being executed, shared with the authored model.
    pub script: Arc<Script>,
    /// Index of the next top-level block to run (the trigger block at
    /// index 0 is skipped at dispatch).
    pub resume_block_index: usize,
    pub wait: Option<WaitState>,
    /// Iteration counters for `repeat_basic`, keyed by loop block id so
    /// nested loops stay independent.
    pub loop_counters: ahash::AHashMap<String, u64>,
    /// Resume positions inside statement bodies, keyed by
    /// `(container block id, body index)`. Written when a nested block
    /// suspends so re-entry of the container continues at the suspended
    /// block instead of re-running the body prefix.
    pub body_resume: ahash::AHashMap<(String, usize), usize>,
    pub break_requested: bool,
    pub continue_requested: bool,
    pub terminate_requested: bool,
    /// Scene that was current when this thread was dispatched. Scene
    /// transitions terminate threads whose dispatch scene is left.
    pub scene_at_dispatch: String,
}

impl ScriptThreadState {
    pub fn new(script: Arc<Script>, scene_at_dispatch: String) -> Self {
        Self {
            script,
            resume_block_index: 1,
            wait: None,
            loop_counters: ahash::AHashMap::new(),
            body_resume: ahash::AHashMap::new(),
            break_requested: false,
            continue_requested: false,
            terminate_requested: false,
            scene_at_dispatch,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.wait.is_some()
    }

    /// True when this thread is waiting on `block_id` specifically. The
    /// synchronous body walker uses this to stop at the suspending block.
    pub fn is_waiting_on(&self, block_id: &str) -> bool {
        self.wait.as_ref().is_some_and(|w| w.block_id == block_id)
    }

    pub fn set_wait(&mut self, kind: WaitKind, end_ms: u64, block_id: &str) {
        self.wait = Some(WaitState {
            kind,
            end_ms,
            block_id: block_id.to_owned(),
        });
    }

    pub fn clear_wait(&mut self) {
        self.wait = None;
    }
}
