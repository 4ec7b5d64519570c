//! String and color reporters. Character positions are 1-based grapheme
//! positions throughout.

use core_model::{Block, ScriptError};
use core_state::World;
use core_value::{Value, color, strings};
use tracing::warn;

use crate::{param_number, param_string};

pub(crate) fn dispatch(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    match block.opcode.as_str() {
        "length_of_string" => {
            let s = param_string(world, object_id, block, 0)?;
            Ok(Value::Number(strings::grapheme_len(&s) as f64))
        }
        "reverse_of_string" => {
            let s = param_string(world, object_id, block, 0)?;
            Ok(Value::string(strings::reverse(&s)))
        }
        "combine_something" => {
            let a = param_string(world, object_id, block, 0)?;
            let b = param_string(world, object_id, block, 1)?;
            Ok(Value::string(format!("{a}{b}")))
        }
        "char_at" => {
            let s = param_string(world, object_id, block, 0)?;
            let index = param_number(world, object_id, block, 1)? as i64;
            if index < 1 {
                warn!(target: "eval.string", object = %object_id, index, "char_at index below 1");
                return Ok(Value::string(""));
            }
            Ok(Value::string(
                strings::char_at(&s, index as usize).unwrap_or_default(),
            ))
        }
        "substring" => {
            let s = param_string(world, object_id, block, 0)?;
            let start = param_number(world, object_id, block, 1)?.max(1.0) as usize;
            let end = param_number(world, object_id, block, 2)?.max(1.0) as usize;
            Ok(Value::string(strings::substring(&s, start, end)))
        }
        "count_match_string" => {
            let haystack = param_string(world, object_id, block, 0)?;
            let needle = param_string(world, object_id, block, 1)?;
            Ok(Value::Number(
                strings::count_matches(&haystack, &needle) as f64
            ))
        }
        "index_of_string" => {
            let haystack = param_string(world, object_id, block, 0)?;
            let needle = param_string(world, object_id, block, 1)?;
            Ok(Value::Number(strings::index_of(&haystack, &needle) as f64))
        }
        "replace_string" => {
            let haystack = param_string(world, object_id, block, 0)?;
            let needle = param_string(world, object_id, block, 1)?;
            let replacement = param_string(world, object_id, block, 2)?;
            Ok(Value::string(strings::replace_first(
                &haystack,
                &needle,
                &replacement,
            )))
        }
        "change_string_case" => {
            let s = param_string(world, object_id, block, 0)?;
            let case = param_string(world, object_id, block, 1)?;
            Ok(Value::string(match case.as_str() {
                "upper" => s.to_uppercase(),
                "lower" => s.to_lowercase(),
                other => {
                    warn!(target: "eval.string", object = %object_id, case = %other, "unknown string case");
                    s
                }
            }))
        }
        other => unreachable!("non-string opcode routed to strops: {other}"),
    }
}

pub(crate) fn rgb_to_hex(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let r = param_number(world, object_id, block, 0)?;
    let g = param_number(world, object_id, block, 1)?;
    let b = param_number(world, object_id, block, 2)?;
    Ok(Value::string(color::rgb_to_hex(r, g, b)))
}

/// Returns the R channel only, as a number. Inherited contract: scripts
/// in the wild depend on it, so it stays until the block itself changes.
pub(crate) fn hex_to_rgb(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let hex = param_string(world, object_id, block, 0)?;
    match color::hex_to_rgb(&hex) {
        Some((r, _g, _b)) => Ok(Value::Number(r as f64)),
        None => Err(ScriptError::new(
            &block.id,
            &block.opcode,
            object_id,
            "잘못된 색상 값입니다",
            format!("invalid hex color literal: {hex:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluate_block;
    use crate::test_support::{block, num, op, world};
    use core_value::Value;

    #[test]
    fn string_reporters() {
        let mut w = world();
        let cases: &[(&str, Vec<core_model::ParamValue>, Value)] = &[
            ("length_of_string", vec![op("hello")], Value::Number(5.0)),
            ("reverse_of_string", vec![op("abc")], Value::string("cba")),
            ("combine_something", vec![op("2"), op("3")], Value::string("23")),
            ("char_at", vec![op("hello"), num(2.0)], Value::string("e")),
            ("char_at", vec![op("hello"), num(9.0)], Value::string("")),
            ("substring", vec![op("hello"), num(2.0), num(4.0)], Value::string("ell")),
            ("count_match_string", vec![op("aaaa"), op("aa")], Value::Number(2.0)),
            ("index_of_string", vec![op("hello"), op("ll")], Value::Number(3.0)),
            ("index_of_string", vec![op("hello"), op("z")], Value::Number(0.0)),
            ("replace_string", vec![op("aaa"), op("a"), op("b")], Value::string("baa")),
            ("change_string_case", vec![op("MiXeD"), op("upper")], Value::string("MIXED")),
            ("change_string_case", vec![op("MiXeD"), op("lower")], Value::string("mixed")),
        ];
        for (opcode, params, expected) in cases {
            let b = block(opcode, params.clone());
            assert_eq!(
                &evaluate_block(&mut w, "obj", &b).unwrap(),
                expected,
                "{opcode}"
            );
        }
    }

    #[test]
    fn rgb_hex_round_trip() {
        let mut w = world();
        let b = block("change_rgb_to_hex", vec![num(255.0), num(0.0), num(128.0)]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::string("#ff0080")
        );

        // hex→rgb reports the R channel only.
        let b = block("change_hex_to_rgb", vec![op("#ff0080")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::Number(255.0)
        );
    }

    #[test]
    fn invalid_hex_is_a_script_error() {
        let mut w = world();
        let b = block("change_hex_to_rgb", vec![op("#nothex")]);
        assert!(evaluate_block(&mut w, "obj", &b).is_err());
    }
}
