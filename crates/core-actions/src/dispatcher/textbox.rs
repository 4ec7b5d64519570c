//! TextBox statements. Only textBox-typed objects carry live text;
//! running these on a sprite is a WARN no-op.

use core_model::{Block, ObjectType, ScriptError};
use core_state::World;
use core_value::color;
use tracing::warn;

use super::{ExecOutcome, param_string, require_entity};

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    require_entity(world, object_id, block)?;
    if world.entity(object_id).unwrap().info.object_type != ObjectType::TextBox {
        warn!(
            target: "exec.textbox",
            object = %object_id,
            opcode = %block.opcode,
            "textbox statement on a sprite; no effect"
        );
        return Ok(ExecOutcome::Completed);
    }

    match block.opcode.as_str() {
        "text_write" => {
            let text = param_string(world, object_id, block, 0)?;
            world.entity_mut(object_id).unwrap().text_content = Some(text);
        }
        "text_append" => {
            let text = param_string(world, object_id, block, 0)?;
            let entity = world.entity_mut(object_id).unwrap();
            let current = entity.text_content.take().unwrap_or_default();
            entity.text_content = Some(format!("{current}{text}"));
        }
        "text_prepend" => {
            let text = param_string(world, object_id, block, 0)?;
            let entity = world.entity_mut(object_id).unwrap();
            let current = entity.text_content.take().unwrap_or_default();
            entity.text_content = Some(format!("{text}{current}"));
        }
        "text_change_font_color" | "text_change_bg_color" => {
            let hex = param_string(world, object_id, block, 0)?;
            if color::hex_to_rgb(&hex).is_none() {
                return Err(ScriptError::new(
                    &block.id,
                    &block.opcode,
                    object_id,
                    "잘못된 색상 값입니다",
                    format!("invalid hex color literal: {hex:?}"),
                ));
            }
            let normalized = if hex.starts_with('#') {
                hex.to_lowercase()
            } else {
                format!("#{}", hex.to_lowercase())
            };
            let entity = world.entity_mut(object_id).unwrap();
            if block.opcode == "text_change_font_color" {
                entity.text_color = normalized;
            } else {
                entity.text_background_color = normalized;
            }
        }
        other => unreachable!("non-textbox opcode routed to textbox: {other}"),
    }
    Ok(ExecOutcome::Completed)
}
