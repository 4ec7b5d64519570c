//! Touch/key/distance sensing reporters.

use core_events::resolve_key_param;
use core_model::{Block, ScriptError};
use core_state::World;
use core_value::Value;
use tracing::warn;

use crate::{param_string, resolve_target_id};

pub(crate) fn is_press_some_key(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let key_param = param_string(world, object_id, block, 0)?;
    let pressed = resolve_key_param(&key_param)
        .map(|key| world.keys_down.contains(&key))
        .unwrap_or(false);
    Ok(Value::Boolean(pressed))
}

/// `reach_something(target)` against walls, the mouse, or another object
/// (clones of the target included).
pub(crate) fn reach_something(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let target = param_string(world, object_id, block, 0)?;
    let Some(entity) = world.entity(object_id) else {
        warn!(target: "eval.sense", object = %object_id, "reach_something on a missing entity");
        return Ok(Value::Boolean(false));
    };

    let (hx, hy) = entity.half_extents();
    let half_w = world.stage.half_width();
    let half_h = world.stage.half_height();

    let touching = match target.as_str() {
        "wall" => {
            entity.x + hx >= half_w
                || entity.x - hx <= -half_w
                || entity.y + hy >= half_h
                || entity.y - hy <= -half_h
        }
        "wall_up" => entity.y + hy >= half_h,
        "wall_down" => entity.y - hy <= -half_h,
        "wall_right" => entity.x + hx >= half_w,
        "wall_left" => entity.x - hx <= -half_w,
        "mouse" => world.mouse.on_stage && entity.contains_point(world.mouse.x, world.mouse.y),
        other_id => {
            // Touching an object means touching it or any of its clones.
            world
                .entity_ids()
                .filter_map(|id| world.entity(id))
                .filter(|e| e.id != entity.id)
                .filter(|e| e.id == other_id || e.original_id == other_id)
                .any(|e| entity.intersects(e))
        }
    };
    Ok(Value::Boolean(touching))
}

/// Euclidean distance from this object to the mouse or another entity.
pub(crate) fn distance_something(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let target = param_string(world, object_id, block, 0)?;
    let Some(entity) = world.entity(object_id) else {
        return Ok(Value::Number(0.0));
    };
    let (tx, ty) = if target == "mouse" {
        (world.mouse.x, world.mouse.y)
    } else {
        let target_id = resolve_target_id(&target, object_id);
        match world.entity(&target_id) {
            Some(t) => (t.x, t.y),
            None => {
                warn!(target: "eval.sense", object = %object_id, target = %target_id, "distance target not found");
                return Ok(Value::Number(0.0));
            }
        }
    };
    Ok(Value::Number(((tx - entity.x).powi(2) + (ty - entity.y).powi(2)).sqrt()))
}
