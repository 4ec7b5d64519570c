//! Arithmetic reporters.

use core_model::{Block, ScriptError};
use core_state::World;
use core_value::{Value, trig};
use rand::Rng;
use tracing::{error, warn};

use crate::{param_number, param_string, param_value};

/// `calc_basic(lhs, op, rhs)`, `op ∈ {PLUS, MINUS, MULTI, DIVIDE}`.
///
/// PLUS is polymorphic: numeric addition only when *both* operands read
/// as finite numbers, string concatenation otherwise. Division by zero
/// is the one reporter failure that kills the thread.
pub(crate) fn calc_basic(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let lhs = param_value(world, object_id, block, 0)?;
    let op = param_string(world, object_id, block, 1)?;
    let rhs = param_value(world, object_id, block, 2)?;

    if op == "PLUS" {
        return Ok(if lhs.is_numeric() && rhs.is_numeric() {
            Value::Number(lhs.as_number() + rhs.as_number())
        } else {
            Value::string(format!("{}{}", lhs.as_string(), rhs.as_string()))
        });
    }

    let a = lhs.as_number();
    let b = rhs.as_number();
    match op.as_str() {
        "MINUS" => Ok(Value::Number(a - b)),
        "MULTI" => Ok(Value::Number(a * b)),
        "DIVIDE" => {
            if b == 0.0 {
                error!(target: "eval.calc", object = %object_id, block = %block.id, "division by zero");
                Err(ScriptError::division_by_zero(
                    &block.id,
                    &block.opcode,
                    object_id,
                ))
            } else {
                Ok(Value::Number(a / b))
            }
        }
        other => {
            warn!(target: "eval.calc", object = %object_id, op = %other, "unknown calc_basic operator");
            Ok(Value::Empty)
        }
    }
}

/// Uniform random in `[min, max]`. Reversed bounds return `min` with a
/// warning rather than guessing what the author meant.
pub(crate) fn calc_rand(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let min = param_number(world, object_id, block, 0)?;
    let max = param_number(world, object_id, block, 1)?;
    if min == max {
        return Ok(Value::Number(min));
    }
    if min > max {
        warn!(
            target: "eval.calc",
            object = %object_id,
            block = %block.id,
            min,
            max,
            "calc_rand with min > max; returning min"
        );
        return Ok(Value::Number(min));
    }
    Ok(Value::Number(rand::thread_rng().gen_range(min..=max)))
}

/// Unary math operators, `_degree` variants included.
pub(crate) fn calc_operation(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let value = param_number(world, object_id, block, 0)?;
    let op = param_string(world, object_id, block, 1)?;

    let result = match op.as_str() {
        "abs" => value.abs(),
        "floor" => value.floor(),
        "ceil" => value.ceil(),
        "round" => value.round(),
        "sqrt" => {
            if value < 0.0 {
                domain_violation(object_id, block, &op, value);
                f64::NAN
            } else {
                value.sqrt()
            }
        }
        // Plain trig takes radians; the `_degree` forms take degrees and
        // go through the canonical-angle table.
        "sin" => value.sin(),
        "cos" => value.cos(),
        "tan" => value.tan(),
        "sin_degree" => trig::sin_deg(value),
        "cos_degree" => trig::cos_deg(value),
        "tan_degree" => trig::tan_deg(value),
        "asin" | "asin_degree" | "acos" | "acos_degree" | "atan" | "atan_degree" => {
            arc_trig(object_id, block, &op, value)
        }
        "log" => {
            if value <= 0.0 {
                domain_violation(object_id, block, &op, value);
                f64::NAN
            } else {
                value.log10()
            }
        }
        "ln" => {
            if value <= 0.0 {
                domain_violation(object_id, block, &op, value);
                f64::NAN
            } else {
                value.ln()
            }
        }
        other => {
            warn!(target: "eval.calc", object = %object_id, op = %other, "unknown calc_operation operator");
            return Ok(Value::Empty);
        }
    };
    Ok(Value::Number(result))
}

fn arc_trig(object_id: &str, block: &Block, op: &str, value: f64) -> f64 {
    let (name, degree_out) = match op.strip_suffix("_degree") {
        Some(base) => (base, true),
        None => (op, false),
    };
    if name != "atan" && !(-1.0..=1.0).contains(&value) {
        domain_violation(object_id, block, op, value);
        return f64::NAN;
    }
    let radians = match name {
        "asin" => value.asin(),
        "acos" => value.acos(),
        _ => value.atan(),
    };
    if degree_out { radians.to_degrees() } else { radians }
}

fn domain_violation(object_id: &str, block: &Block, op: &str, value: f64) {
    error!(
        target: "eval.calc",
        object = %object_id,
        block = %block.id,
        op = %op,
        value,
        "math domain violation; result is NaN"
    );
}

/// Integer division and modulo with floor semantics. A zero divisor
/// yields NaN (with an ERROR log), not a thread failure.
pub(crate) fn quotient_and_mod(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<Value, ScriptError> {
    let a = param_number(world, object_id, block, 0)?;
    let op = param_string(world, object_id, block, 1)?;
    let b = param_number(world, object_id, block, 2)?;

    if b == 0.0 {
        error!(target: "eval.calc", object = %object_id, block = %block.id, op = %op, "division by zero; result is NaN");
        return Ok(Value::Number(f64::NAN));
    }
    let quotient = (a / b).floor();
    Ok(Value::Number(match op.as_str() {
        "QUOTIENT" => quotient,
        _ => a - b * quotient,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate_block;
    use crate::test_support::{block, num, op, world};

    #[test]
    fn plus_is_polymorphic() {
        let mut w = world();
        let b = block("calc_basic", vec![op("2"), op("PLUS"), op("3")]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(5.0));

        let b = block("calc_basic", vec![op("hi"), op("PLUS"), op("!")]);
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::string("hi!")
        );

        // A boolean operand forces concatenation.
        let b = block(
            "calc_basic",
            vec![core_model::ParamValue::Bool(true), op("PLUS"), num(2.0)],
        );
        assert_eq!(
            evaluate_block(&mut w, "obj", &b).unwrap(),
            Value::string("true2")
        );
    }

    #[test]
    fn subtraction_of_numeric_strings() {
        let mut w = world();
        let b = block("calc_basic", vec![op(" 10 "), op("MINUS"), op("4")]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(6.0));
    }

    #[test]
    fn divide_by_zero_fails_the_thread() {
        let mut w = world();
        let b = block("calc_basic", vec![num(1.0), op("DIVIDE"), num(0.0)]);
        let err = evaluate_block(&mut w, "obj", &b).unwrap_err();
        assert_eq!(err.human, "0으로 나눌 수 없습니다");
        assert_eq!(err.object_id, "obj");
    }

    #[test]
    fn rand_respects_bounds() {
        let mut w = world();
        let b = block("calc_rand", vec![num(1.0), num(10.0)]);
        let mut sum = 0.0;
        for _ in 0..10_000 {
            let v = evaluate_block(&mut w, "obj", &b).unwrap().as_number();
            assert!((1.0..=10.0).contains(&v));
            sum += v;
        }
        let mean = sum / 10_000.0;
        assert!((mean - 5.5).abs() < 0.2, "mean {mean} too far from 5.5");

        let b = block("calc_rand", vec![num(4.0), num(4.0)]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(4.0));
        let b = block("calc_rand", vec![num(9.0), num(2.0)]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(9.0));
    }

    #[test]
    fn math_operations() {
        let mut w = world();
        let cases = [
            (-4.5, "abs", 4.5),
            (1.7, "floor", 1.0),
            (1.2, "ceil", 2.0),
            (2.5, "round", 3.0),
            (9.0, "sqrt", 3.0),
            (90.0, "sin_degree", 1.0),
            (180.0, "cos_degree", -1.0),
            (1.0, "asin_degree", 90.0),
            (100.0, "log", 2.0),
            (1.0, "ln", 0.0),
        ];
        for (input, operator, expected) in cases {
            let b = block("calc_operation", vec![num(input), op(operator)]);
            let got = evaluate_block(&mut w, "obj", &b).unwrap().as_number();
            assert!(
                (got - expected).abs() < 1e-9,
                "{operator}({input}) = {got}, expected {expected}"
            );
        }
    }

    #[test]
    fn math_domain_violations_are_nan() {
        let mut w = world();
        for (input, operator) in [(-1.0, "sqrt"), (0.0, "log"), (-2.0, "ln"), (1.5, "asin")] {
            let b = block("calc_operation", vec![num(input), op(operator)]);
            assert!(evaluate_block(&mut w, "obj", &b).unwrap().as_number().is_nan());
        }
    }

    #[test]
    fn quotient_and_mod_floor_semantics() {
        let mut w = world();
        let b = block("quotient_and_mod", vec![num(-7.0), op("QUOTIENT"), num(2.0)]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(-4.0));
        let b = block("quotient_and_mod", vec![num(-7.0), op("MOD"), num(2.0)]);
        assert_eq!(evaluate_block(&mut w, "obj", &b).unwrap(), Value::Number(1.0));
        let b = block("quotient_and_mod", vec![num(7.0), op("MOD"), num(0.0)]);
        assert!(evaluate_block(&mut w, "obj", &b).unwrap().as_number().is_nan());
    }
}
