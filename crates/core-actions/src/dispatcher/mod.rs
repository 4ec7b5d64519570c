//! Statement dispatcher, decomposed per block category:
//! * `moving`   - position, timed moves, rotation, wall bounce
//! * `looks`    - visibility, dialog, costume, effects, scale, z-order
//! * `sound`    - owner-scoped playback, global volume/speed, BGM
//! * `variable` - variables, lists, ask-and-wait, display flags
//! * `flow`     - waits, loops, branches, stop/restart, clones
//! * `textbox`  - textbox content and colors
//! * `event`    - message cast, scene transitions
//!
//! Opcodes are dispatched by exact name; a name no category claims is a
//! WARN no-op, matching how the editor tolerates unknown blocks.

use core_model::{Block, ScriptError};
use core_state::{ThreadId, World};
use core_value::Value;
use tracing::warn;

mod event;
mod flow;
mod looks;
mod moving;
mod sound;
mod textbox;
mod variable;

/// Result of executing a single statement block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The block finished; the slice advances.
    Completed,
    /// The block recorded a wait on the calling thread; the slice ends.
    Suspended,
}

/// Execute one statement block on `object_id` within `thread_id`.
pub fn execute_block(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    match block.opcode.as_str() {
        "move_direction" | "bounce_wall" | "move_x" | "move_y" | "locate_x" | "locate_y"
        | "locate_xy" | "locate" | "move_xy_time" | "locate_xy_time" | "locate_object_time"
        | "rotate_relative" | "direction_relative" | "rotate_absolute" | "direction_absolute"
        | "rotate_by_time" | "direction_relative_duration" | "see_angle_object"
        | "move_to_angle" => moving::execute(world, object_id, thread_id, block),

        "show" | "hide" | "dialog" | "dialog_time" | "remove_dialog" | "change_to_some_shape"
        | "change_to_next_shape" | "add_effect_amount" | "change_effect_amount"
        | "erase_all_effects" | "change_scale_size" | "set_scale_size" | "stretch_scale_size"
        | "reset_scale_size" | "flip_x" | "flip_y" | "change_object_index" => {
            looks::execute(world, object_id, block)
        }

        "sound_something_with_block" | "sound_something_second_with_block" | "sound_from_to"
        | "sound_something_wait_with_block" | "sound_something_second_wait_with_block"
        | "sound_from_to_and_wait" | "sound_volume_change" | "sound_volume_set"
        | "sound_speed_change" | "sound_speed_set" | "sound_silent_all" | "play_bgm" => {
            sound::execute(world, object_id, thread_id, block)
        }

        "set_variable" | "change_variable" | "ask_and_wait" | "add_value_to_list"
        | "remove_value_from_list" | "insert_value_to_list" | "change_value_list_index"
        | "show_variable" | "hide_variable" | "show_list" | "hide_list" | "set_visible_answer"
        | "set_visible_project_timer" => variable::execute(world, object_id, thread_id, block),

        "wait_second" | "repeat_basic" | "repeat_inf" | "repeat_while_true" | "stop_repeat"
        | "continue_repeat" | "_if" | "if_else" | "wait_until_true" | "stop_object"
        | "restart_project" | "create_clone" | "delete_clone" | "remove_all_clones"
        | "choose_project_timer_action" => flow::execute(world, object_id, thread_id, block),

        "text_write" | "text_append" | "text_prepend" | "text_change_font_color"
        | "text_change_bg_color" => textbox::execute(world, object_id, block),

        "message_cast" | "start_scene" | "start_neighbor_scene" => {
            event::execute(world, object_id, block)
        }

        other => {
            warn!(
                target: "exec",
                object = %object_id,
                block = %block.id,
                opcode = %other,
                "unknown statement opcode; skipped"
            );
            Ok(ExecOutcome::Completed)
        }
    }
}

// -- shared param helpers ---------------------------------------------

pub(crate) fn param_value(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<Value, ScriptError> {
    match block.param(index) {
        Some(param) => core_eval::evaluate(world, object_id, param),
        None => Ok(Value::Empty),
    }
}

pub(crate) fn param_number(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<f64, ScriptError> {
    Ok(param_value(world, object_id, block, index)?.as_number())
}

pub(crate) fn param_string(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<String, ScriptError> {
    Ok(param_value(world, object_id, block, index)?.as_string())
}

/// `"self"` / empty target params name the current object.
pub(crate) fn resolve_target_id(target: &str, object_id: &str) -> String {
    if target.is_empty() || target == "self" {
        object_id.to_owned()
    } else {
        target.to_owned()
    }
}

/// Missing-entity guard shared by handlers that require a live entity.
pub(crate) fn require_entity(
    world: &World,
    object_id: &str,
    block: &Block,
) -> Result<(), ScriptError> {
    if world.entity(object_id).is_some() {
        Ok(())
    } else {
        Err(ScriptError::new(
            &block.id,
            &block.opcode,
            object_id,
            "대상 객체를 찾을 수 없습니다",
            "entity not found",
        ))
    }
}
