//! Reporter evaluation.
//!
//! `evaluate` turns a parameter field into a `Value`: literals pass
//! through, absent params read as Empty, and nested reporter blocks
//! dispatch by opcode and recurse into their own params. Evaluation is
//! read-mostly — the only mutation it performs on the world is the
//! cloud-mirror refresh inside variable resolution.
//!
//! Error policy: almost everything degrades (WARN log, zero value of the
//! expected kind). The exception is division by zero in `calc_basic`,
//! which fails the whole thread with a structured error.

mod calc;
mod compare;
mod env;
mod lookup;
mod sensing;
mod strops;

use core_model::{Block, ParamValue, ScriptError};
use core_state::World;
use core_value::Value;
use tracing::warn;

/// Evaluate one parameter field in the context of `object_id`.
pub fn evaluate(
    world: &mut World,
    object_id: &str,
    param: &ParamValue,
) -> Result<Value, ScriptError> {
    match param {
        ParamValue::Text(s) => Ok(Value::string(s.clone())),
        ParamValue::Number(n) => Ok(Value::Number(*n)),
        ParamValue::Bool(b) => Ok(Value::Boolean(*b)),
        ParamValue::Block(block) => evaluate_block(world, object_id, block),
    }
}

/// Evaluate a reporter block.
pub fn evaluate_block(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    match block.opcode.as_str() {
        // Literal wrappers: the value is the first param, verbatim.
        "number" | "text" | "text_reporter_number" | "text_reporter_string" | "text_color"
        | "get_pictures" | "get_sounds" => Ok(literal_param(block, 0)),
        "get_boolean_value" => Ok(Value::Boolean(param_value(world, object_id, block, 0)?.as_bool())),

        "calc_basic" => calc::calc_basic(world, object_id, block),
        "calc_rand" => calc::calc_rand(world, object_id, block),
        "calc_operation" => calc::calc_operation(world, object_id, block),
        "quotient_and_mod" => calc::quotient_and_mod(world, object_id, block),

        "boolean_basic_operator" => compare::basic_operator(world, object_id, block),
        "boolean_and_or" => compare::and_or(world, object_id, block),
        "boolean_not" => compare::not(world, object_id, block),
        "is_type" => compare::is_type(world, object_id, block),

        "length_of_string" | "reverse_of_string" | "combine_something" | "char_at"
        | "substring" | "count_match_string" | "index_of_string" | "replace_string"
        | "change_string_case" => strops::dispatch(world, object_id, block),
        "change_rgb_to_hex" => strops::rgb_to_hex(world, object_id, block),
        "change_hex_to_rgb" => strops::hex_to_rgb(world, object_id, block),

        "get_project_timer_value" => Ok(env::project_timer_value(world)),
        "get_date" => env::get_date(world, object_id, block),
        "coordinate_mouse" => env::coordinate_mouse(world, object_id, block),
        "coordinate_object" => env::coordinate_object(world, object_id, block),
        "get_sound_duration" => env::sound_duration(world, object_id, block),
        "get_sound_volume" => Ok(Value::Number(world.sound.volume * 100.0)),
        "get_sound_speed" => Ok(Value::Number(world.sound.speed * 100.0)),
        "get_block_count" => env::block_count(world, object_id, block),
        "get_canvas_input_value" => Ok(Value::string(world.answer())),
        "text_read" => env::text_read(world, object_id, block),
        "get_user_name" | "get_nickname" => {
            // No account system attached; the editor reports blanks too.
            Ok(Value::string(""))
        }
        "is_current_device_type" => env::is_current_device_type(world, object_id, block),
        "is_touch_supported" => Ok(Value::Boolean(false)),
        "is_boost_mode" => Ok(Value::Boolean(false)),

        "get_variable" => lookup::get_variable(world, object_id, block),
        "value_of_index_from_list" => lookup::value_of_index_from_list(world, object_id, block),
        "length_of_list" => lookup::length_of_list(world, object_id, block),
        "is_included_in_list" => lookup::is_included_in_list(world, object_id, block),

        "is_clicked" => Ok(Value::Boolean(world.mouse.pressed_this_tick)),
        "is_object_clicked" => Ok(Value::Boolean(
            world.mouse.pressed_object_id.as_deref() == Some(object_id),
        )),
        "is_press_some_key" => sensing::is_press_some_key(world, object_id, block),
        "reach_something" => sensing::reach_something(world, object_id, block),
        "distance_something" => sensing::distance_something(world, object_id, block),

        other => {
            warn!(
                target: "eval",
                object = %object_id,
                block = %block.id,
                opcode = %other,
                "unknown reporter opcode; evaluates to empty"
            );
            Ok(Value::Empty)
        }
    }
}

/// First-param literal for leaf wrapper blocks.
fn literal_param(block: &Block, index: usize) -> Value {
    block
        .param(index)
        .and_then(ParamValue::as_literal)
        .unwrap_or(Value::Empty)
}

/// Evaluate the param at `index`, Empty when absent.
pub(crate) fn param_value(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<Value, ScriptError> {
    match block.param(index) {
        Some(param) => evaluate(world, object_id, param),
        None => Ok(Value::Empty),
    }
}

/// Evaluate the param at `index` as a number (0 on non-numeric input).
pub(crate) fn param_number(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<f64, ScriptError> {
    Ok(param_value(world, object_id, block, index)?.as_number())
}

/// Evaluate the param at `index` as a string.
pub(crate) fn param_string(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<String, ScriptError> {
    Ok(param_value(world, object_id, block, index)?.as_string())
}

/// Resolve a target-entity param: `"self"` and the empty string mean the
/// current object.
pub(crate) fn resolve_target_id(target: &str, object_id: &str) -> String {
    if target.is_empty() || target == "self" {
        object_id.to_owned()
    } else {
        target.to_owned()
    }
}
