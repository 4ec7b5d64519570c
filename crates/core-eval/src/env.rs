//! Environment reporters: project timer, dates, mouse and object
//! coordinates, sound properties, block counts, textbox reads.

use core_model::{Block, ObjectType, ScriptError, Script};
use core_state::World;
use core_value::Value;
use time::OffsetDateTime;
use tracing::warn;

use crate::{param_string, resolve_target_id};

pub(crate) fn project_timer_value(world: &World) -> Value {
    Value::Number(world.timer.value_ms(world.now_ms()) as f64 / 1000.0)
}

/// `get_date(unit)`. YEAR/MONTH/DAY are numbers; HOUR/MINUTE/SECOND are
/// zero-padded two-character strings (that is what the editor displays).
pub(crate) fn get_date(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let unit = param_string(world, object_id, block, 0)?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(match unit.as_str() {
        "YEAR" => Value::Number(now.year() as f64),
        "MONTH" => Value::Number(u8::from(now.month()) as f64),
        "DAY" => Value::Number(now.day() as f64),
        "HOUR" => Value::string(format!("{:02}", now.hour())),
        "MINUTE" => Value::string(format!("{:02}", now.minute())),
        "SECOND" => Value::string(format!("{:02}", now.second())),
        other => {
            warn!(target: "eval.env", object = %object_id, unit = %other, "unknown get_date unit");
            Value::Empty
        }
    })
}

pub(crate) fn coordinate_mouse(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let axis = param_string(world, object_id, block, 0)?;
    Ok(match axis.as_str() {
        "x" => Value::Number(world.mouse.x),
        "y" => Value::Number(world.mouse.y),
        other => {
            warn!(target: "eval.env", object = %object_id, axis = %other, "unknown coordinate_mouse axis");
            Value::Number(0.0)
        }
    })
}

/// `coordinate_object(target, kind)` with
/// `kind ∈ {x, y, rotation, direction, size, picture_index, picture_name}`.
pub(crate) fn coordinate_object(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let target = param_string(world, object_id, block, 0)?;
    let kind = param_string(world, object_id, block, 1)?;
    let target_id = resolve_target_id(&target, object_id);

    let Some(entity) = world.entity(&target_id) else {
        warn!(target: "eval.env", object = %object_id, target = %target_id, "coordinate_object target not found");
        return Ok(if kind == "picture_name" {
            Value::string("")
        } else {
            Value::Number(0.0)
        });
    };

    Ok(match kind.as_str() {
        "x" => Value::Number(entity.x),
        "y" => Value::Number(entity.y),
        "rotation" => Value::Number(entity.rotation),
        "direction" => Value::Number(entity.direction),
        // Size as a percentage, one decimal place.
        "size" => Value::Number((entity.scale_x * 100.0 * 10.0).round() / 10.0),
        "picture_index" => Value::Number(
            entity.costume_index().map(|i| i as f64 + 1.0).unwrap_or(0.0),
        ),
        "picture_name" => Value::string(
            entity
                .costume_index()
                .and_then(|i| entity.info.costumes.get(i))
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        ),
        other => {
            warn!(target: "eval.env", object = %object_id, kind = %other, "unknown coordinate_object kind");
            Value::Number(0.0)
        }
    })
}

/// Duration in seconds of one of the owner's sounds, from the authored
/// metadata.
pub(crate) fn sound_duration(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let sound_id = param_string(world, object_id, block, 0)?;
    let duration = world
        .entity(object_id)
        .and_then(|e| {
            e.info
                .sounds
                .iter()
                .find(|s| s.id == sound_id || s.name == sound_id)
                .map(|s| s.duration)
        })
        .unwrap_or_else(|| {
            warn!(target: "eval.env", object = %object_id, sound = %sound_id, "sound not found");
            0.0
        });
    Ok(Value::Number(duration))
}

/// `get_block_count(scope)`: `all`, a scene id, an object id, or `self`.
/// Counts statement blocks recursively; reporter params do not count.
pub(crate) fn block_count(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let scope = param_string(world, object_id, block, 0)?;
    let scope_id = resolve_target_id(&scope, object_id);

    let count: usize = if scope == "all" {
        world
            .objects
            .values()
            .map(|info| info.scripts.iter().map(count_blocks).sum::<usize>())
            .sum()
    } else if world.scene_exists(&scope_id) {
        world
            .objects
            .values()
            .filter(|info| info.scene_id == scope_id)
            .map(|info| info.scripts.iter().map(count_blocks).sum::<usize>())
            .sum()
    } else if let Some(info) = world.objects.get(&scope_id) {
        info.scripts.iter().map(count_blocks).sum()
    } else {
        warn!(target: "eval.env", object = %object_id, scope = %scope, "unknown get_block_count scope");
        0
    };
    Ok(Value::Number(count as f64))
}

fn count_blocks(script: &Script) -> usize {
    script
        .blocks
        .iter()
        .map(|b| 1 + b.statements.iter().map(count_blocks).sum::<usize>())
        .sum()
}

/// `text_read(target)`: textbox content, empty string for sprites.
pub(crate) fn text_read(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let target = param_string(world, object_id, block, 0)?;
    let target_id = resolve_target_id(&target, object_id);
    let text = world
        .entity(&target_id)
        .filter(|e| e.info.object_type == ObjectType::TextBox)
        .and_then(|e| e.text_content.clone())
        .unwrap_or_default();
    Ok(Value::string(text))
}

/// This runtime is always a desktop build.
pub(crate) fn is_current_device_type(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let kind = param_string(world, object_id, block, 0)?;
    Ok(Value::Boolean(kind == "desktop"))
}

#[cfg(test)]
mod tests {
    use crate::evaluate_block;
    use crate::test_support::{block, op, world, world_with_clock};
    use core_value::Value;

    #[test]
    fn timer_reads_seconds() {
        let (mut w, clock) = world_with_clock();
        w.timer.start(w.now_ms());
        clock.advance_ms(1500);
        let b = block("get_project_timer_value", vec![]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(1.5)
        );
    }

    #[test]
    fn object_coordinates() {
        let mut w = world();
        w.entity_mut("obj").unwrap().x = 12.5;
        let b = block("coordinate_object", vec![op("self"), op("x")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(12.5)
        );

        let b = block("coordinate_object", vec![op("box"), op("y")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(50.0)
        );

        let b = block("coordinate_object", vec![op("self"), op("picture_index")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(1.0)
        );
        let b = block("coordinate_object", vec![op("self"), op("picture_name")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::string("shape one")
        );

        // Unknown target degrades.
        let b = block("coordinate_object", vec![op("ghost"), op("x")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(0.0)
        );
    }

    #[test]
    fn size_is_a_rounded_percentage() {
        let mut w = world();
        w.entity_mut("obj").unwrap().scale_x = 1.2345;
        let b = block("coordinate_object", vec![op("self"), op("size")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(123.5)
        );
    }

    #[test]
    fn sound_metadata() {
        let mut w = world();
        let b = block("get_sound_duration", vec![op("snd1")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(2.5)
        );
        let b = block("get_sound_duration", vec![op("missing")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(0.0)
        );
        let b = block("get_sound_volume", vec![]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(100.0)
        );
    }

    #[test]
    fn text_read_is_textbox_only() {
        let mut w = world();
        let b = block("text_read", vec![op("box")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::string("hello")
        );
        let b = block("text_read", vec![op("obj")]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::string(""));
    }

    #[test]
    fn device_predicates() {
        let mut w = world();
        let b = block("is_current_device_type", vec![op("desktop")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Boolean(true)
        );
        let b = block("is_current_device_type", vec![op("mobile")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Boolean(false)
        );
        let b = block("is_touch_supported", vec![]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Boolean(false)
        );
    }
}
