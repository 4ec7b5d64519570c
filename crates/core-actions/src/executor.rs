//! Slice and body execution.
//!
//! A **slice** is one thread's span of execution within a tick: resume
//! at `resume_block_index`, run blocks until the first suspension or
//! end-of-script. A suspending block keeps the index at itself when its
//! wait is block-internal (re-entry re-runs it) and advances past
//! itself for explicit waits (timer, sound, text input).
//!
//! Bodies nested under containers (`_if`, loops) run through
//! [`run_body`], which records a per-body resume position whenever an
//! inner block suspends. Re-entering the container therefore continues
//! at the suspended block; the body prefix never re-runs.

use core_model::Script;
use core_state::{ThreadId, World};
use tracing::{debug, error};

use crate::dispatcher::{ExecOutcome, execute_block};

/// How a slice ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceResult {
    /// A wait is recorded; the scheduler resumes the thread once it
    /// clears.
    Suspended,
    /// End of script, termination, failure, or the owning entity is
    /// gone. The thread state is dead either way.
    Finished,
}

/// Run one slice of `thread_id` on `object_id`.
pub fn run_slice(world: &mut World, object_id: &str, thread_id: ThreadId) -> SliceResult {
    loop {
        let Some(state) = thread_state(world, object_id, thread_id) else {
            return SliceResult::Finished;
        };
        if state.terminate_requested {
            return SliceResult::Finished;
        }
        if state.is_waiting() {
            return SliceResult::Suspended;
        }
        let index = state.resume_block_index;
        let script = std::sync::Arc::clone(&state.script);
        let Some(block) = script.blocks.get(index) else {
            return SliceResult::Finished;
        };

        match execute_block(world, object_id, thread_id, block) {
            Err(err) => {
                // The fault stays inside this thread: log with block
                // coordinates and tear the thread down.
                error!(target: "exec", %err, "script thread failed");
                return SliceResult::Finished;
            }
            Ok(outcome) => {
                let Some(state) = thread_state_mut(world, object_id, thread_id) else {
                    return SliceResult::Finished;
                };
                if state.terminate_requested {
                    return SliceResult::Finished;
                }
                match outcome {
                    ExecOutcome::Completed => {
                        state.resume_block_index = index + 1;
                    }
                    ExecOutcome::Suspended => {
                        if state
                            .wait
                            .as_ref()
                            .is_some_and(|w| w.block_id == block.id && w.kind.advances_resume())
                        {
                            state.resume_block_index = index + 1;
                        }
                        return SliceResult::Suspended;
                    }
                }
            }
        }
    }
}

/// Execute a statement body belonging to `container` (body `body_index`
/// of the block with that id), resuming mid-body when a previous slice
/// suspended inside it.
///
/// Returns `Suspended` as soon as an executed block leaves the thread
/// waiting; `Completed` otherwise. Break/continue/terminate requests are
/// flags on the thread state — the body keeps executing after
/// `stop_repeat`/`continue_repeat` (the enclosing loop inspects the
/// flags once the body returns), but terminates between blocks on
/// `terminate_requested`.
pub(crate) fn run_body(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    container_id: &str,
    body_index: usize,
    body: &Script,
) -> Result<ExecOutcome, core_model::ScriptError> {
    let key = (container_id.to_owned(), body_index);
    let start = thread_state_mut(world, object_id, thread_id)
        .and_then(|s| s.body_resume.remove(&key))
        .unwrap_or(0);
    if start > 0 {
        debug!(
            target: "exec",
            object = %object_id,
            container = %container_id,
            start,
            "resuming mid-body"
        );
    }

    for (offset, block) in body.blocks.iter().enumerate().skip(start) {
        let outcome = execute_block(world, object_id, thread_id, block)?;

        let Some(state) = thread_state_mut(world, object_id, thread_id) else {
            return Ok(ExecOutcome::Completed);
        };
        if state.terminate_requested {
            return Ok(ExecOutcome::Completed);
        }
        if outcome == ExecOutcome::Suspended && state.is_waiting() {
            // Record where to pick the body back up. Explicit waits on
            // the block itself resume after it; block-internal waits
            // (and waits owned by deeper containers) re-enter the block.
            let resume_at = if state.is_waiting_on(&block.id)
                && state.wait.as_ref().is_some_and(|w| w.kind.advances_resume())
            {
                offset + 1
            } else {
                offset
            };
            state.body_resume.insert(key, resume_at);
            return Ok(ExecOutcome::Suspended);
        }
    }
    Ok(ExecOutcome::Completed)
}

/// True when a resume position is stored for this container body — the
/// container is being re-entered to continue a suspended body and must
/// not re-evaluate its entry condition.
pub(crate) fn has_body_resume(
    world: &World,
    object_id: &str,
    thread_id: ThreadId,
    container_id: &str,
    body_index: usize,
) -> bool {
    world
        .entity(object_id)
        .and_then(|e| e.threads.get(&thread_id))
        .is_some_and(|s| {
            s.body_resume
                .contains_key(&(container_id.to_owned(), body_index))
        })
}

pub(crate) fn thread_state<'w>(
    world: &'w World,
    object_id: &str,
    thread_id: ThreadId,
) -> Option<&'w core_state::ScriptThreadState> {
    world.entity(object_id).and_then(|e| e.threads.get(&thread_id))
}

pub(crate) fn thread_state_mut<'w>(
    world: &'w mut World,
    object_id: &str,
    thread_id: ThreadId,
) -> Option<&'w mut core_state::ScriptThreadState> {
    world
        .entity_mut(object_id)
        .and_then(|e| e.threads.get_mut(&thread_id))
}
