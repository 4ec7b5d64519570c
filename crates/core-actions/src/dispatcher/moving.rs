//! Motion statements.
//!
//! Angles follow the stage convention: degrees, 0 pointing right along
//! +x, counter-clockwise positive with y up. `move_direction` therefore
//! advances `(dist·cos θ, dist·sin θ)`.
//!
//! Timed blocks keep their progress in the entity's timed-operation
//! slots and set a block-internal one-tick wait per step; the slice
//! re-enters the same block every frame until the slot drains.

use core_model::{Block, ScriptError};
use core_state::{
    CollisionSide, PenKind, RotationField, RotationMethod, ThreadId, TimedMove,
    TimedMoveToObject, TimedRotation, WaitKind, World, normalize_degrees,
};
use tracing::warn;

use super::{ExecOutcome, param_number, param_string, require_entity, resolve_target_id};
use crate::executor::thread_state_mut;

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    require_entity(world, object_id, block)?;
    match block.opcode.as_str() {
        "move_direction" => {
            let dist = param_number(world, object_id, block, 0)?;
            let dir = match block.param(1) {
                Some(_) => param_number(world, object_id, block, 1)?,
                None => world.entity(object_id).map(|e| e.direction).unwrap_or(0.0),
            };
            let (x, y) = {
                let e = world.entity(object_id).unwrap();
                let rad = dir.to_radians();
                (e.x + dist * rad.cos(), e.y + dist * rad.sin())
            };
            set_position(world, object_id, x, y);
            Ok(ExecOutcome::Completed)
        }
        "move_x" | "move_y" => {
            let delta = param_number(world, object_id, block, 0)?;
            let (x, y) = {
                let e = world.entity(object_id).unwrap();
                if block.opcode == "move_x" {
                    (e.x + delta, e.y)
                } else {
                    (e.x, e.y + delta)
                }
            };
            set_position(world, object_id, x, y);
            Ok(ExecOutcome::Completed)
        }
        "locate_x" | "locate_y" => {
            let value = param_number(world, object_id, block, 0)?;
            let (x, y) = {
                let e = world.entity(object_id).unwrap();
                if block.opcode == "locate_x" {
                    (value, e.y)
                } else {
                    (e.x, value)
                }
            };
            set_position(world, object_id, x, y);
            Ok(ExecOutcome::Completed)
        }
        "locate_xy" => {
            let x = param_number(world, object_id, block, 0)?;
            let y = param_number(world, object_id, block, 1)?;
            set_position(world, object_id, x, y);
            Ok(ExecOutcome::Completed)
        }
        "locate" => {
            let target = param_string(world, object_id, block, 0)?;
            if target == "mouse" {
                // Only track a pointer that is actually over the stage.
                if world.mouse.on_stage {
                    let (x, y) = (world.mouse.x, world.mouse.y);
                    set_position(world, object_id, x, y);
                }
            } else {
                let target_id = resolve_target_id(&target, object_id);
                match world.entity(&target_id).map(|t| (t.x, t.y)) {
                    Some((x, y)) => set_position(world, object_id, x, y),
                    None => {
                        warn!(target: "exec.moving", object = %object_id, target = %target_id, "locate target not found")
                    }
                }
            }
            Ok(ExecOutcome::Completed)
        }
        "move_xy_time" | "locate_xy_time" => timed_move(world, object_id, thread_id, block),
        "locate_object_time" => timed_move_to_object(world, object_id, thread_id, block),
        "rotate_relative" => {
            let delta = param_number(world, object_id, block, 0)?;
            let e = world.entity_mut(object_id).unwrap();
            e.rotation = normalize_degrees(e.rotation + delta);
            Ok(ExecOutcome::Completed)
        }
        "direction_relative" => {
            let delta = param_number(world, object_id, block, 0)?;
            let e = world.entity_mut(object_id).unwrap();
            e.direction = normalize_degrees(e.direction + delta);
            Ok(ExecOutcome::Completed)
        }
        "rotate_absolute" => {
            let value = param_number(world, object_id, block, 0)?;
            world.entity_mut(object_id).unwrap().rotation = normalize_degrees(value);
            Ok(ExecOutcome::Completed)
        }
        "direction_absolute" => {
            let value = param_number(world, object_id, block, 0)?;
            world.entity_mut(object_id).unwrap().direction = normalize_degrees(value);
            Ok(ExecOutcome::Completed)
        }
        "rotate_by_time" | "direction_relative_duration" => {
            let field = if block.opcode == "rotate_by_time" {
                RotationField::Rotation
            } else {
                RotationField::Direction
            };
            timed_rotation(world, object_id, thread_id, block, field)
        }
        "see_angle_object" => {
            let target = param_string(world, object_id, block, 0)?;
            let (sx, sy) = {
                let e = world.entity(object_id).unwrap();
                (e.x, e.y)
            };
            let aim = if target == "mouse" {
                Some((world.mouse.x, world.mouse.y))
            } else {
                let target_id = resolve_target_id(&target, object_id);
                world.entity(&target_id).map(|t| (t.x, t.y))
            };
            match aim {
                Some((tx, ty)) => {
                    let angle = (ty - sy).atan2(tx - sx).to_degrees();
                    world.entity_mut(object_id).unwrap().direction = normalize_degrees(angle);
                }
                None => {
                    warn!(target: "exec.moving", object = %object_id, target = %target, "see_angle_object target not found")
                }
            }
            Ok(ExecOutcome::Completed)
        }
        "move_to_angle" => {
            let angle = param_number(world, object_id, block, 0)?;
            let dist = param_number(world, object_id, block, 1)?;
            let (x, y) = {
                let e = world.entity(object_id).unwrap();
                let rad = angle.to_radians();
                (e.x + dist * rad.cos(), e.y + dist * rad.sin())
            };
            set_position(world, object_id, x, y);
            Ok(ExecOutcome::Completed)
        }
        "bounce_wall" => {
            bounce_wall(world, object_id);
            Ok(ExecOutcome::Completed)
        }
        other => unreachable!("non-moving opcode routed to moving: {other}"),
    }
}

/// Position write that feeds both pens and collects emitted segments
/// into the world's line buffer.
pub(crate) fn set_position(world: &mut World, object_id: &str, x: f64, y: f64) {
    let Some(entity) = world.entity_mut(object_id) else {
        return;
    };
    let segments = entity.set_position(x, y);
    if segments.is_empty() {
        return;
    }
    let owner = entity.id.clone();
    let brush_color = entity.brush.color.clone();
    let paint_color = entity.paint.color.clone();
    for (from, to, kind) in segments {
        let color = match kind {
            PenKind::Brush => brush_color.clone(),
            PenKind::Paint => paint_color.clone(),
        };
        world.pen_lines.push(core_state::PenLine {
            owner: owner.clone(),
            kind,
            from,
            to,
            color,
        });
    }
}

fn timed_move(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    if world.entity(object_id).unwrap().timed_move.is_none() {
        let seconds = param_number(world, object_id, block, 0)?;
        let target_x = param_number(world, object_id, block, 1)?;
        let target_y = param_number(world, object_id, block, 2)?;
        let total = (seconds * world.target_fps as f64).floor().max(1.0) as u64;
        if total <= 1 {
            set_position(world, object_id, target_x, target_y);
            return Ok(ExecOutcome::Completed);
        }
        world.entity_mut(object_id).unwrap().timed_move = Some(TimedMove {
            target_x,
            target_y,
            remaining_frames: total,
        });
    }

    let Some(slot) = world.entity(object_id).unwrap().timed_move else {
        return Ok(ExecOutcome::Completed);
    };
    let (x, y) = {
        let e = world.entity(object_id).unwrap();
        let step_x = (slot.target_x - e.x) / slot.remaining_frames as f64;
        let step_y = (slot.target_y - e.y) / slot.remaining_frames as f64;
        (e.x + step_x, e.y + step_y)
    };
    set_position(world, object_id, x, y);

    let remaining = slot.remaining_frames - 1;
    if remaining == 0 {
        // Snap exactly onto the target on the final frame.
        set_position(world, object_id, slot.target_x, slot.target_y);
        world.entity_mut(object_id).unwrap().timed_move = None;
        Ok(ExecOutcome::Completed)
    } else {
        if let Some(active) = world
            .entity_mut(object_id)
            .and_then(|e| e.timed_move.as_mut())
        {
            active.remaining_frames = remaining;
        }
        suspend_one_tick(world, object_id, thread_id, block);
        Ok(ExecOutcome::Suspended)
    }
}

fn timed_move_to_object(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    if world.entity(object_id).unwrap().timed_move_to_object.is_none() {
        let seconds = param_number(world, object_id, block, 0)?;
        let target = param_string(world, object_id, block, 1)?;
        let total = (seconds * world.target_fps as f64).floor().max(1.0) as u64;
        world.entity_mut(object_id).unwrap().timed_move_to_object = Some(TimedMoveToObject {
            target_id: resolve_target_id(&target, object_id),
            remaining_frames: total,
        });
    }

    let Some(slot) = world.entity(object_id).unwrap().timed_move_to_object.clone() else {
        return Ok(ExecOutcome::Completed);
    };
    // The target is re-read every frame: it may be moving too.
    let aim = if slot.target_id == "mouse" {
        Some((world.mouse.x, world.mouse.y))
    } else {
        world.entity(&slot.target_id).map(|t| (t.x, t.y))
    };
    let Some((tx, ty)) = aim else {
        warn!(target: "exec.moving", object = %object_id, target = %slot.target_id, "timed-follow target lost; aborting move");
        world.entity_mut(object_id).unwrap().timed_move_to_object = None;
        return Ok(ExecOutcome::Completed);
    };

    let (x, y) = {
        let e = world.entity(object_id).unwrap();
        let step_x = (tx - e.x) / slot.remaining_frames as f64;
        let step_y = (ty - e.y) / slot.remaining_frames as f64;
        (e.x + step_x, e.y + step_y)
    };
    set_position(world, object_id, x, y);

    let remaining = slot.remaining_frames - 1;
    if remaining == 0 {
        set_position(world, object_id, tx, ty);
        world.entity_mut(object_id).unwrap().timed_move_to_object = None;
        Ok(ExecOutcome::Completed)
    } else {
        if let Some(active) = world
            .entity_mut(object_id)
            .and_then(|e| e.timed_move_to_object.as_mut())
        {
            active.remaining_frames = remaining;
        }
        suspend_one_tick(world, object_id, thread_id, block);
        Ok(ExecOutcome::Suspended)
    }
}

fn timed_rotation(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
    field: RotationField,
) -> Result<ExecOutcome, ScriptError> {
    if world.entity(object_id).unwrap().timed_rotation.is_none() {
        let seconds = param_number(world, object_id, block, 0)?;
        let angle = param_number(world, object_id, block, 1)?;
        let total = (seconds * world.target_fps as f64).floor().max(1.0) as u64;
        world.entity_mut(object_id).unwrap().timed_rotation = Some(TimedRotation {
            field,
            step_deg: angle / total as f64,
            remaining_frames: total,
        });
    }

    let Some(slot) = world.entity(object_id).unwrap().timed_rotation else {
        return Ok(ExecOutcome::Completed);
    };
    {
        let e = world.entity_mut(object_id).unwrap();
        match slot.field {
            RotationField::Rotation => e.rotation = normalize_degrees(e.rotation + slot.step_deg),
            RotationField::Direction => {
                e.direction = normalize_degrees(e.direction + slot.step_deg)
            }
        }
    }

    let remaining = slot.remaining_frames - 1;
    if remaining == 0 {
        world.entity_mut(object_id).unwrap().timed_rotation = None;
        Ok(ExecOutcome::Completed)
    } else {
        if let Some(active) = world
            .entity_mut(object_id)
            .and_then(|e| e.timed_rotation.as_mut())
        {
            active.remaining_frames = remaining;
        }
        suspend_one_tick(world, object_id, thread_id, block);
        Ok(ExecOutcome::Suspended)
    }
}

fn suspend_one_tick(world: &mut World, object_id: &str, thread_id: ThreadId, block: &Block) {
    let now = world.now_ms();
    if let Some(state) = thread_state_mut(world, object_id, thread_id) {
        state.set_wait(WaitKind::BlockInternal, now, &block.id);
    }
}

/// Reflect off the stage walls.
///
/// The movement angle is `rotation + direction` for free rotation,
/// `direction` otherwise, normalized to [0, 360). Horizontal walls
/// (top/bottom) reflect the angle to `-θ`; vertical walls (left/right)
/// to `180 - θ`. `last_collision_side` suppresses a second reflection
/// off the same wall until the entity has left it, and resets whenever
/// a frame sees no contact at all.
fn bounce_wall(world: &mut World, object_id: &str) {
    let half_w = world.stage.half_width();
    let half_h = world.stage.half_height();
    let Some(entity) = world.entity_mut(object_id) else {
        return;
    };

    let free = entity.rotation_method == RotationMethod::Free;
    let angle = normalize_degrees(if free {
        entity.rotation + entity.direction
    } else {
        entity.direction
    });
    let (hx, hy) = entity.half_extents();

    let moving_up = angle > 0.0 && angle < 180.0;
    let moving_down = angle > 180.0 && angle < 360.0;
    let moving_right = angle < 90.0 || angle > 270.0;
    let moving_left = angle > 90.0 && angle < 270.0;

    let touching_up = entity.y + hy >= half_h;
    let touching_down = entity.y - hy <= -half_h;
    let touching_right = entity.x + hx >= half_w;
    let touching_left = entity.x - hx <= -half_w;

    let last = entity.last_collision_side;
    let hit = if touching_up && moving_up && last != CollisionSide::Up {
        Some((CollisionSide::Up, 360.0 - angle))
    } else if touching_down && moving_down && last != CollisionSide::Down {
        Some((CollisionSide::Down, 360.0 - angle))
    } else if touching_right && moving_right && last != CollisionSide::Right {
        Some((CollisionSide::Right, 180.0 - angle))
    } else if touching_left && moving_left && last != CollisionSide::Left {
        Some((CollisionSide::Left, 180.0 - angle))
    } else {
        None
    };

    match hit {
        Some((side, reflected)) => {
            let reflected = normalize_degrees(reflected);
            if free {
                entity.rotation = normalize_degrees(reflected - entity.direction);
            } else {
                entity.direction = reflected;
            }
            entity.last_collision_side = side;
        }
        None => {
            if !(touching_up || touching_down || touching_right || touching_left) {
                entity.last_collision_side = CollisionSide::None;
            }
        }
    }
}
