//! Looks statements: visibility, dialog bubbles, costumes, graphical
//! effects, scale, and draw-order moves.

use core_model::{Block, ScriptError};
use core_state::{Dialog, DialogKind, Effects, World};
use tracing::warn;

use super::{ExecOutcome, param_number, param_string, require_entity};

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    require_entity(world, object_id, block)?;
    match block.opcode.as_str() {
        "show" => {
            world.entity_mut(object_id).unwrap().visible = true;
        }
        "hide" => {
            world.entity_mut(object_id).unwrap().visible = false;
        }
        "dialog" | "dialog_time" => {
            let text = param_string(world, object_id, block, 0)?;
            let (duration_ms, kind_index) = if block.opcode == "dialog_time" {
                let seconds = param_number(world, object_id, block, 1)?.max(0.0);
                ((seconds * 1000.0) as u64, 2)
            } else {
                (0, 1)
            };
            let kind = match param_string(world, object_id, block, kind_index)?.as_str() {
                "think" => DialogKind::Think,
                _ => DialogKind::Speak,
            };
            let now = world.now_ms();
            let entity = world.entity_mut(object_id).unwrap();
            // An empty message clears the bubble instead of showing one.
            entity.dialog = (!text.is_empty()).then_some(Dialog {
                text,
                kind,
                start_ms: now,
                duration_ms,
            });
        }
        "remove_dialog" => {
            world.entity_mut(object_id).unwrap().dialog = None;
        }
        "change_to_some_shape" => {
            let costume = param_string(world, object_id, block, 0)?;
            let entity = world.entity_mut(object_id).unwrap();
            match entity.info.costume_index(&costume) {
                Some(index) => {
                    entity.current_costume_id = entity.info.costumes[index].id.clone();
                }
                None => {
                    warn!(target: "exec.looks", object = %object_id, costume = %costume, "costume not found");
                }
            }
        }
        "change_to_next_shape" => {
            let which = param_string(world, object_id, block, 0)?;
            let entity = world.entity_mut(object_id).unwrap();
            let count = entity.info.costumes.len();
            if count == 0 {
                warn!(target: "exec.looks", object = %object_id, "object has no costumes");
            } else {
                let current = entity.costume_index().unwrap_or(0);
                let next = if which == "prev" {
                    (current + count - 1) % count
                } else {
                    (current + 1) % count
                };
                entity.current_costume_id = entity.info.costumes[next].id.clone();
            }
        }
        "add_effect_amount" | "change_effect_amount" => {
            let kind = param_string(world, object_id, block, 0)?;
            let amount = param_number(world, object_id, block, 1)?;
            let absolute = block.opcode == "change_effect_amount";
            let effects = &mut world.entity_mut(object_id).unwrap().effects;
            match kind.as_str() {
                "color" => {
                    effects.hue = if absolute { amount } else { effects.hue + amount };
                }
                "brightness" => {
                    effects.brightness = if absolute {
                        amount
                    } else {
                        effects.brightness + amount
                    };
                }
                // The block speaks transparency percent; storage is an
                // opacity factor.
                "transparency" => {
                    effects.alpha = if absolute {
                        1.0 - amount / 100.0
                    } else {
                        effects.alpha - amount / 100.0
                    }
                    .clamp(0.0, 1.0);
                }
                other => {
                    warn!(target: "exec.looks", object = %object_id, effect = %other, "unknown effect kind");
                }
            }
        }
        "erase_all_effects" => {
            world.entity_mut(object_id).unwrap().effects = Effects::default();
        }
        "change_scale_size" => {
            let delta = param_number(world, object_id, block, 0)? / 100.0;
            let entity = world.entity_mut(object_id).unwrap();
            // Grow/shrink magnitude; a mirrored axis keeps its sign.
            entity.scale_x += delta * entity.scale_x.signum();
            entity.scale_y += delta * entity.scale_y.signum();
        }
        "set_scale_size" => {
            let factor = param_number(world, object_id, block, 0)? / 100.0;
            let entity = world.entity_mut(object_id).unwrap();
            entity.scale_x = factor.abs() * entity.scale_x.signum();
            entity.scale_y = factor.abs() * entity.scale_y.signum();
        }
        "stretch_scale_size" => {
            let dimension = param_string(world, object_id, block, 0)?;
            let factor = param_number(world, object_id, block, 1)? / 100.0;
            let entity = world.entity_mut(object_id).unwrap();
            match dimension.as_str() {
                "x" => entity.scale_x = factor.abs() * entity.scale_x.signum(),
                "y" => entity.scale_y = factor.abs() * entity.scale_y.signum(),
                other => {
                    warn!(target: "exec.looks", object = %object_id, dimension = %other, "unknown stretch dimension");
                }
            }
        }
        "reset_scale_size" => {
            let entity = world.entity_mut(object_id).unwrap();
            entity.scale_x = entity.info.init.scale_x;
            entity.scale_y = entity.info.init.scale_y;
        }
        // Vertical flip mirrors the y axis, horizontal flip the x axis.
        "flip_x" => {
            let entity = world.entity_mut(object_id).unwrap();
            entity.scale_y = -entity.scale_y;
        }
        "flip_y" => {
            let entity = world.entity_mut(object_id).unwrap();
            entity.scale_x = -entity.scale_x;
        }
        "change_object_index" => {
            let op = param_string(world, object_id, block, 0)?;
            match op.as_str() {
                "FRONT" => world.bring_to_front(object_id),
                "FORWARD" => world.move_forward(object_id),
                "BACKWARD" => world.move_backward(object_id),
                "BACK" => world.send_to_back(object_id),
                other => {
                    warn!(target: "exec.looks", object = %object_id, op = %other, "unknown z-order operation");
                }
            }
        }
        other => unreachable!("non-looks opcode routed to looks: {other}"),
    }
    Ok(ExecOutcome::Completed)
}
