//! Boolean reporters: comparison, combinators, type predicate.

use core_model::{Block, ScriptError};
use core_state::World;
use core_value::Value;
use tracing::warn;

use crate::{param_string, param_value};

/// `boolean_basic_operator(lhs, op, rhs)`.
///
/// Numeric comparison when both sides read as numbers. Otherwise
/// EQUAL/NOT_EQUAL compare as strings, and the ordering operators fall
/// back to numeric coercion (non-numeric reads as 0).
pub(crate) fn basic_operator(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let lhs = param_value(world, object_id, block, 0)?;
    let op = param_string(world, object_id, block, 1)?;
    let rhs = param_value(world, object_id, block, 2)?;

    let result = if lhs.is_numeric() && rhs.is_numeric() {
        let a = lhs.as_number();
        let b = rhs.as_number();
        match op.as_str() {
            "EQUAL" => a == b,
            "NOT_EQUAL" => a != b,
            "GREATER" => a > b,
            "LESS" => a < b,
            "GREATER_OR_EQUAL" => a >= b,
            "LESS_OR_EQUAL" => a <= b,
            other => return unknown_operator(object_id, other),
        }
    } else {
        match op.as_str() {
            "EQUAL" => lhs.as_string() == rhs.as_string(),
            "NOT_EQUAL" => lhs.as_string() != rhs.as_string(),
            // Ordering of non-numeric values coerces through numbers.
            "GREATER" => lhs.as_number() > rhs.as_number(),
            "LESS" => lhs.as_number() < rhs.as_number(),
            "GREATER_OR_EQUAL" => lhs.as_number() >= rhs.as_number(),
            "LESS_OR_EQUAL" => lhs.as_number() <= rhs.as_number(),
            other => return unknown_operator(object_id, other),
        }
    };
    Ok(Value::Boolean(result))
}

fn unknown_operator(object_id: &str, op: &str) -> Result<Value, ScriptError> {
    warn!(target: "eval.bool", object = %object_id, op = %op, "unknown comparison operator");
    Ok(Value::Boolean(false))
}

/// AND/OR with short-circuit on the left operand.
pub(crate) fn and_or(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let lhs = param_value(world, object_id, block, 0)?.as_bool();
    let op = param_string(world, object_id, block, 1)?;
    let result = match op.as_str() {
        "AND" => lhs && param_value(world, object_id, block, 2)?.as_bool(),
        "OR" => lhs || param_value(world, object_id, block, 2)?.as_bool(),
        other => {
            warn!(target: "eval.bool", object = %object_id, op = %other, "unknown boolean combinator");
            false
        }
    };
    Ok(Value::Boolean(result))
}

pub(crate) fn not(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    Ok(Value::Boolean(!param_value(world, object_id, block, 0)?.as_bool()))
}

/// `is_type(value, type)` with `type ∈ {number, en, ko}`.
pub(crate) fn is_type(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let value = param_value(world, object_id, block, 0)?;
    let kind = param_string(world, object_id, block, 1)?;
    let s = value.as_string();
    let result = match kind.as_str() {
        "number" => value.is_numeric(),
        "en" => !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()),
        "ko" => !s.is_empty() && s.chars().all(|c| ('가'..='힣').contains(&c)),
        other => {
            warn!(target: "eval.bool", object = %object_id, kind = %other, "unknown is_type kind");
            false
        }
    };
    Ok(Value::Boolean(result))
}
