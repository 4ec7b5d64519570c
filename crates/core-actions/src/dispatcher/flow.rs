//! Flow statements: waits, loops, branches, stop/restart, clone
//! lifecycle, project timer control.
//!
//! Loop pacing contract: a loop body that completes without suspending
//! still costs one frame — the loop sets a block-internal wait on
//! itself and is re-entered next tick. A body that suspends returns
//! immediately and the same iteration resumes (via the body-resume
//! position) when the wait clears. `continue_repeat` does not skip the
//! inter-iteration frame.

use core_model::{Block, ScriptError};
use core_state::{ThreadId, WaitKind, World};
use tracing::{info, warn};

use super::{ExecOutcome, param_number, param_string, param_value, resolve_target_id};
use crate::executor::{has_body_resume, run_body, thread_state_mut};

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    match block.opcode.as_str() {
        "wait_second" => {
            let seconds = param_number(world, object_id, block, 0)?.max(0.0);
            let end_ms = world.now_ms() + (seconds * 1000.0) as u64;
            if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                state.set_wait(WaitKind::ExplicitSecond, end_ms, &block.id);
            }
            Ok(ExecOutcome::Suspended)
        }
        "repeat_basic" => repeat_basic(world, object_id, thread_id, block),
        "repeat_inf" => repeat_inf(world, object_id, thread_id, block),
        "repeat_while_true" => repeat_while_true(world, object_id, thread_id, block),
        "stop_repeat" => {
            if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                state.break_requested = true;
            }
            Ok(ExecOutcome::Completed)
        }
        "continue_repeat" => {
            if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                state.continue_requested = true;
            }
            Ok(ExecOutcome::Completed)
        }
        "_if" => {
            let Some(body) = block.body(0) else {
                return Ok(ExecOutcome::Completed);
            };
            // A stored body position means this is a resume: run the
            // suspended body without re-evaluating the condition.
            if has_body_resume(world, object_id, thread_id, &block.id, 0)
                || param_value(world, object_id, block, 0)?.as_bool()
            {
                return run_body(world, object_id, thread_id, &block.id, 0, body);
            }
            Ok(ExecOutcome::Completed)
        }
        "if_else" => {
            if has_body_resume(world, object_id, thread_id, &block.id, 0) {
                return run_branch(world, object_id, thread_id, block, 0);
            }
            if has_body_resume(world, object_id, thread_id, &block.id, 1) {
                return run_branch(world, object_id, thread_id, block, 1);
            }
            let branch = if param_value(world, object_id, block, 0)?.as_bool() {
                0
            } else {
                1
            };
            run_branch(world, object_id, thread_id, block, branch)
        }
        "wait_until_true" => {
            if param_value(world, object_id, block, 0)?.as_bool() {
                Ok(ExecOutcome::Completed)
            } else {
                let now = world.now_ms();
                if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                    state.set_wait(WaitKind::BlockInternal, now, &block.id);
                }
                Ok(ExecOutcome::Suspended)
            }
        }
        "stop_object" => {
            let target = param_string(world, object_id, block, 0)?;
            stop_object(world, object_id, thread_id, &target);
            Ok(ExecOutcome::Completed)
        }
        "restart_project" => {
            info!(target: "exec.flow", object = %object_id, "project restart requested");
            world.restart_requested = true;
            // Everything dies at the tick boundary; stop slices now.
            let ids: Vec<String> = world.entity_ids().cloned().collect();
            for id in ids {
                if let Some(entity) = world.entity_mut(&id) {
                    entity.terminate_all_threads();
                }
            }
            Ok(ExecOutcome::Completed)
        }
        "create_clone" => {
            let target = param_string(world, object_id, block, 0)?;
            let source_id = resolve_target_id(&target, object_id);
            world.spawn_clone(&source_id);
            Ok(ExecOutcome::Completed)
        }
        "delete_clone" => {
            let is_clone = world.entity(object_id).is_some_and(|e| e.is_clone);
            if is_clone {
                world.delete_entity(object_id);
            } else {
                warn!(target: "exec.flow", object = %object_id, "delete_clone on an original; no effect");
            }
            Ok(ExecOutcome::Completed)
        }
        "remove_all_clones" => {
            let original = world
                .entity(object_id)
                .map(|e| e.original_id.clone())
                .unwrap_or_else(|| object_id.to_owned());
            world.remove_clones_of(&original);
            Ok(ExecOutcome::Completed)
        }
        "choose_project_timer_action" => {
            let action = param_string(world, object_id, block, 0)?;
            let now = world.now_ms();
            match action.as_str() {
                "START" => world.timer.start(now),
                "STOP" => world.timer.stop(now),
                "RESET" => world.timer.reset(),
                other => {
                    warn!(target: "exec.flow", object = %object_id, action = %other, "unknown timer action");
                }
            }
            Ok(ExecOutcome::Completed)
        }
        other => unreachable!("non-flow opcode routed to flow: {other}"),
    }
}

fn run_branch(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
    branch: usize,
) -> Result<ExecOutcome, ScriptError> {
    match block.body(branch) {
        Some(body) => run_body(world, object_id, thread_id, &block.id, branch, body),
        None => Ok(ExecOutcome::Completed),
    }
}

/// Flags set by the body run, consumed by the enclosing loop.
struct LoopFlags {
    broke: bool,
    terminated: bool,
}

fn take_loop_flags(world: &mut World, object_id: &str, thread_id: ThreadId) -> LoopFlags {
    match thread_state_mut(world, object_id, thread_id) {
        Some(state) => {
            let broke = state.break_requested;
            state.break_requested = false;
            // The iteration ran to completion either way; consume the
            // continue flag here so it cannot leak into an outer loop.
            state.continue_requested = false;
            LoopFlags {
                broke,
                terminated: state.terminate_requested,
            }
        }
        None => LoopFlags {
            broke: false,
            terminated: true,
        },
    }
}

fn pace_loop(world: &mut World, object_id: &str, thread_id: ThreadId, block: &Block) {
    let now = world.now_ms();
    if let Some(state) = thread_state_mut(world, object_id, thread_id) {
        state.set_wait(WaitKind::BlockInternal, now, &block.id);
    }
}

fn repeat_basic(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    let count = param_number(world, object_id, block, 0)?;
    if count < 0.0 {
        return Err(ScriptError::new(
            &block.id,
            &block.opcode,
            object_id,
            "반복 횟수는 음수일 수 없습니다",
            format!("negative repeat count {count}"),
        ));
    }
    let count = count.floor() as u64;
    let resuming = has_body_resume(world, object_id, thread_id, &block.id, 0);

    let iteration = thread_state_mut(world, object_id, thread_id)
        .and_then(|s| s.loop_counters.get(&block.id).copied())
        .unwrap_or(0);
    if !resuming && iteration >= count {
        if let Some(state) = thread_state_mut(world, object_id, thread_id) {
            state.loop_counters.remove(&block.id);
        }
        return Ok(ExecOutcome::Completed);
    }

    let Some(body) = block.body(0) else {
        return Ok(ExecOutcome::Completed);
    };
    if run_body(world, object_id, thread_id, &block.id, 0, body)? == ExecOutcome::Suspended {
        return Ok(ExecOutcome::Suspended);
    }

    let flags = take_loop_flags(world, object_id, thread_id);
    if flags.terminated {
        return Ok(ExecOutcome::Completed);
    }
    if flags.broke {
        if let Some(state) = thread_state_mut(world, object_id, thread_id) {
            state.loop_counters.remove(&block.id);
        }
        return Ok(ExecOutcome::Completed);
    }

    if let Some(state) = thread_state_mut(world, object_id, thread_id) {
        state.loop_counters.insert(block.id.clone(), iteration + 1);
    }
    // One frame per iteration; the count check happens on re-entry.
    pace_loop(world, object_id, thread_id, block);
    Ok(ExecOutcome::Suspended)
}

fn repeat_inf(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    let Some(body) = block.body(0) else {
        // An empty forever loop still paces, one frame per turn.
        pace_loop(world, object_id, thread_id, block);
        return Ok(ExecOutcome::Suspended);
    };
    if run_body(world, object_id, thread_id, &block.id, 0, body)? == ExecOutcome::Suspended {
        return Ok(ExecOutcome::Suspended);
    }
    let flags = take_loop_flags(world, object_id, thread_id);
    if flags.terminated || flags.broke {
        return Ok(ExecOutcome::Completed);
    }
    pace_loop(world, object_id, thread_id, block);
    Ok(ExecOutcome::Suspended)
}

fn repeat_while_true(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    // Resume path skips the top-of-loop condition: the iteration already
    // started when it suspended.
    if !has_body_resume(world, object_id, thread_id, &block.id, 0)
        && !param_value(world, object_id, block, 0)?.as_bool()
    {
        return Ok(ExecOutcome::Completed);
    }
    let Some(body) = block.body(0) else {
        pace_loop(world, object_id, thread_id, block);
        return Ok(ExecOutcome::Suspended);
    };
    if run_body(world, object_id, thread_id, &block.id, 0, body)? == ExecOutcome::Suspended {
        return Ok(ExecOutcome::Suspended);
    }
    let flags = take_loop_flags(world, object_id, thread_id);
    if flags.terminated || flags.broke {
        return Ok(ExecOutcome::Completed);
    }
    pace_loop(world, object_id, thread_id, block);
    Ok(ExecOutcome::Suspended)
}

/// Mark terminate flags on the scoped set of thread states. The calling
/// thread survives only the `otherThreads` scope.
fn stop_object(world: &mut World, object_id: &str, thread_id: ThreadId, target: &str) {
    match target {
        "all" => {
            let ids: Vec<String> = world.entity_ids().cloned().collect();
            for id in ids {
                if let Some(entity) = world.entity_mut(&id) {
                    entity.terminate_all_threads();
                }
            }
        }
        "thisOnly" | "thisObject" | "this_object" => {
            if let Some(entity) = world.entity_mut(object_id) {
                entity.terminate_all_threads();
            }
        }
        "otherObjects" | "other_objects" => {
            let ids: Vec<String> = world
                .entity_ids()
                .filter(|id| id.as_str() != object_id)
                .cloned()
                .collect();
            for id in ids {
                if let Some(entity) = world.entity_mut(&id) {
                    entity.terminate_all_threads();
                }
            }
        }
        "thisThread" | "this_thread" => {
            if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                state.terminate_requested = true;
            }
        }
        "otherThreads" | "otherThreadsOfThisObject" | "other_threads" => {
            if let Some(entity) = world.entity_mut(object_id) {
                for (id, state) in entity.threads.iter_mut() {
                    if *id != thread_id {
                        state.terminate_requested = true;
                    }
                }
            }
        }
        other => {
            warn!(target: "exec.flow", object = %object_id, scope = %other, "unknown stop_object scope");
        }
    }
}
