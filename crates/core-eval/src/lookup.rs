//! Variable and list reporters. Resolution is object scope first, then
//! global; a miss logs and yields the zero value of the expected kind.

use core_model::{Block, ScriptError, VariableKind};
use core_state::World;
use core_value::Value;
use rand::Rng;
use tracing::{error, warn};

use crate::{param_string, param_value};

pub(crate) fn get_variable(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let var_id = param_string(world, object_id, block, 0)?;
    // Timer and answer reads route through their live sources.
    let timer_value = world.timer.value_ms(world.now_ms()) as f64 / 1000.0;
    match world.vars.resolve(&var_id, object_id) {
        Some(entry) => Ok(match entry.kind {
            VariableKind::Timer => Value::Number(timer_value),
            VariableKind::List => {
                warn!(target: "eval.lookup", object = %object_id, id = %var_id, "get_variable on a list");
                Value::Empty
            }
            _ => entry.value.clone(),
        }),
        None => {
            error!(target: "eval.lookup", object = %object_id, id = %var_id, "variable not found");
            Ok(Value::Empty)
        }
    }
}

/// `value_of_index_from_list(list, index)` where the index is 1-based,
/// `"last"`, or `"random"`.
pub(crate) fn value_of_index_from_list(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let list_id = param_string(world, object_id, block, 0)?;
    let index_value = param_value(world, object_id, block, 1)?;

    let Some(entry) = world.vars.resolve(&list_id, object_id) else {
        error!(target: "eval.lookup", object = %object_id, id = %list_id, "list not found");
        return Ok(Value::string(""));
    };
    let items = &entry.items;
    if items.is_empty() {
        warn!(target: "eval.lookup", object = %object_id, id = %list_id, "index into empty list");
        return Ok(Value::string(""));
    }

    let index = match index_value.as_string().as_str() {
        "last" => items.len(),
        "random" => rand::thread_rng().gen_range(1..=items.len()),
        _ => {
            let n = index_value.as_number();
            if n < 1.0 || n > items.len() as f64 || n.fract() != 0.0 {
                warn!(
                    target: "eval.lookup",
                    object = %object_id,
                    id = %list_id,
                    index = n,
                    len = items.len(),
                    "list index out of range"
                );
                return Ok(Value::string(""));
            }
            n as usize
        }
    };
    Ok(Value::string(items[index - 1].clone()))
}

pub(crate) fn length_of_list(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let list_id = param_string(world, object_id, block, 0)?;
    match world.vars.resolve(&list_id, object_id) {
        Some(entry) => Ok(Value::Number(entry.items.len() as f64)),
        None => {
            error!(target: "eval.lookup", object = %object_id, id = %list_id, "list not found");
            Ok(Value::Number(0.0))
        }
    }
}

/// Membership test by exact string match of the coerced value.
pub(crate) fn is_included_in_list(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let list_id = param_string(world, object_id, block, 0)?;
    let needle = param_string(world, object_id, block, 1)?;
    match world.vars.resolve(&list_id, object_id) {
        Some(entry) => Ok(Value::Boolean(entry.items.iter().any(|i| i == &needle))),
        None => {
            error!(target: "eval.lookup", object = %object_id, id = %list_id, "list not found");
            Ok(Value::Boolean(false))
        }
    }
}
