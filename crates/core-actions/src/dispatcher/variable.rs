//! Variable and list statements, `ask_and_wait`, and HUD display flags.
//!
//! Writes resolve object scope first, then global, and flush cloud
//! entries to the mirror afterwards. List indexes are 1-based; every
//! out-of-range write is a WARN no-op.

use core_model::{Block, ScriptError, VariableKind};
use core_state::{Dialog, DialogKind, ThreadId, WaitKind, World};
use core_value::Value;
use tracing::warn;

use super::{ExecOutcome, param_number, param_string, param_value, require_entity};
use crate::executor::thread_state_mut;

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    match block.opcode.as_str() {
        "set_variable" => {
            let var_id = param_string(world, object_id, block, 0)?;
            let value = param_value(world, object_id, block, 1)?;
            match world.vars.resolve_mut(&var_id, object_id) {
                Some(entry) if entry.kind == VariableKind::Timer => {
                    warn!(target: "exec.vars", object = %object_id, id = %var_id, "the project timer cannot be assigned");
                }
                Some(entry) => {
                    entry.value = value;
                    world.vars.after_write(&var_id, object_id);
                }
                None => missing(object_id, &var_id),
            }
        }
        "change_variable" => {
            let var_id = param_string(world, object_id, block, 0)?;
            let delta = param_value(world, object_id, block, 1)?;
            match world.vars.resolve_mut(&var_id, object_id) {
                Some(entry) => {
                    // Numeric add when both sides read as numbers, else
                    // string concatenation. Numeric results re-format on
                    // display via the shared number formatter.
                    entry.value = if entry.value.is_numeric() && delta.is_numeric() {
                        Value::Number(entry.value.as_number() + delta.as_number())
                    } else {
                        Value::string(format!(
                            "{}{}",
                            entry.value.as_string(),
                            delta.as_string()
                        ))
                    };
                    world.vars.after_write(&var_id, object_id);
                }
                None => missing(object_id, &var_id),
            }
        }
        "ask_and_wait" => {
            require_entity(world, object_id, block)?;
            let question = param_string(world, object_id, block, 0)?;
            if question.is_empty() {
                return Err(ScriptError::new(
                    &block.id,
                    &block.opcode,
                    object_id,
                    "질문 내용이 비어있습니다",
                    "ask_and_wait question is empty",
                ));
            }
            let now = world.now_ms();
            let entity = world.entity_mut(object_id).unwrap();
            entity.dialog = Some(Dialog {
                text: question,
                kind: DialogKind::Speak,
                start_ms: now,
                duration_ms: 0,
            });
            if let Some(state) = thread_state_mut(world, object_id, thread_id) {
                state.set_wait(WaitKind::TextInput, now, &block.id);
            }
            return Ok(ExecOutcome::Suspended);
        }
        "add_value_to_list" => {
            let value = param_string(world, object_id, block, 0)?;
            let list_id = param_string(world, object_id, block, 1)?;
            match world.vars.resolve_mut(&list_id, object_id) {
                Some(entry) => {
                    entry.items.push(value);
                    world.vars.after_write(&list_id, object_id);
                }
                None => missing(object_id, &list_id),
            }
        }
        "remove_value_from_list" => {
            let index = param_number(world, object_id, block, 0)?;
            let list_id = param_string(world, object_id, block, 1)?;
            match world.vars.resolve_mut(&list_id, object_id) {
                Some(entry) => {
                    if let Some(i) = checked_index(index, entry.items.len()) {
                        entry.items.remove(i);
                        world.vars.after_write(&list_id, object_id);
                    } else {
                        warn!(
                            target: "exec.vars",
                            object = %object_id,
                            id = %list_id,
                            index,
                            len = entry.items.len(),
                            "remove index out of range"
                        );
                    }
                }
                None => missing(object_id, &list_id),
            }
        }
        "insert_value_to_list" => {
            let list_id = param_string(world, object_id, block, 0)?;
            let index = param_number(world, object_id, block, 1)?;
            let value = param_string(world, object_id, block, 2)?;
            match world.vars.resolve_mut(&list_id, object_id) {
                Some(entry) => {
                    // Insertion targets an existing slot only; appending
                    // past the end is what add_value_to_list is for.
                    if let Some(i) = checked_index(index, entry.items.len()) {
                        entry.items.insert(i, value);
                        world.vars.after_write(&list_id, object_id);
                    } else {
                        warn!(
                            target: "exec.vars",
                            object = %object_id,
                            id = %list_id,
                            index,
                            len = entry.items.len(),
                            "insert index out of range"
                        );
                    }
                }
                None => missing(object_id, &list_id),
            }
        }
        "change_value_list_index" => {
            let list_id = param_string(world, object_id, block, 0)?;
            let index = param_number(world, object_id, block, 1)?;
            let value = param_string(world, object_id, block, 2)?;
            match world.vars.resolve_mut(&list_id, object_id) {
                Some(entry) => {
                    if let Some(i) = checked_index(index, entry.items.len()) {
                        entry.items[i] = value;
                        world.vars.after_write(&list_id, object_id);
                    } else {
                        warn!(
                            target: "exec.vars",
                            object = %object_id,
                            id = %list_id,
                            index,
                            len = entry.items.len(),
                            "replace index out of range"
                        );
                    }
                }
                None => missing(object_id, &list_id),
            }
        }
        "show_variable" | "hide_variable" | "show_list" | "hide_list" => {
            let id = param_string(world, object_id, block, 0)?;
            let visible = block.opcode.starts_with("show");
            match world.vars.resolve_mut(&id, object_id) {
                Some(entry) => entry.visible = visible,
                None => missing(object_id, &id),
            }
        }
        "set_visible_answer" => {
            let visible = param_string(world, object_id, block, 0)? != "HIDE";
            for entry in world.vars.iter_mut() {
                if entry.kind == VariableKind::Answer {
                    entry.visible = visible;
                }
            }
        }
        "set_visible_project_timer" => {
            let visible = param_string(world, object_id, block, 0)? != "HIDE";
            world.timer.visible = visible;
            for entry in world.vars.iter_mut() {
                if entry.kind == VariableKind::Timer {
                    entry.visible = visible;
                }
            }
        }
        other => unreachable!("non-variable opcode routed to variable: {other}"),
    }
    Ok(ExecOutcome::Completed)
}

/// Valid 1-based index into an existing slot, or `None`.
fn checked_index(index: f64, len: usize) -> Option<usize> {
    (index >= 1.0 && index <= len as f64 && index.fract() == 0.0).then(|| index as usize - 1)
}

fn missing(object_id: &str, id: &str) {
    warn!(target: "exec.vars", object = %object_id, id = %id, "variable or list not found");
}
