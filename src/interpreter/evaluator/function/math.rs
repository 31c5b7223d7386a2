use std::{f64::consts, sync::Arc};

use bigdecimal::RoundingMode;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{
            core::Value,
            function::{Arguments, Arity, Builtin, BuiltinObj},
            numeric::{Number, normalize},
        },
    },
};

fn number(value: &Value, what: &str) -> EvalResult<Number> {
    Number::from_value(value).ok_or_else(|| {
                                 RuntimeError::type_error(format!("{what}() expects a number, got {}",
                                                                  value.type_name()))
                             })
}

/// Returns the absolute value of a number, keeping its kind.
///
/// `abs` of the smallest `Integer` promotes to a big integer.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run("abs(-4)", "main").unwrap().as_i64(), Some(4));
/// assert_eq!(evaluator.run("abs(-2.5)", "main").unwrap().to_string(), "2.5");
/// ```
pub fn abs(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(match number(args.at(0)?, "abs")? {
           Number::Int(i) => i.checked_abs().map_or_else(|| normalize(BigInt::from(i).abs()), Value::Integer),
           Number::UInt(u) => Value::UInteger(u),
           Number::Big(b) => normalize(b.abs()),
           Number::Float(f) => Value::Float(f.abs()),
           Number::Decimal(d) => Value::BigFloat(Arc::new(d.abs())),
       })
}

/// `math.sqrt(x)`: the square root as a float, or as a decimal for decimal
/// input.
///
/// # Errors
/// Returns an `ArithmeticError` for negative input.
pub fn sqrt(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let number = number(args.at(0)?, "sqrt")?;
    if number.is_negative() {
        return Err(RuntimeError::arithmetic(format!("square root of negative number {}", args.at(0)?)));
    }
    Ok(match number {
           Number::Decimal(d) => {
               d.sqrt()
                .map(|root| Value::BigFloat(Arc::new(root)))
                .ok_or_else(|| RuntimeError::arithmetic("square root is undefined"))?
           },
           other => Value::Float(other.to_f64().sqrt()),
       })
}

/// `math.floor(x)`: the greatest integer not above `x`.
pub fn floor(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    round(args.at(0)?, "floor", RoundingMode::Floor)
}

/// `math.ceil(x)`: the least integer not below `x`.
pub fn ceil(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    round(args.at(0)?, "ceil", RoundingMode::Ceiling)
}

fn round(value: &Value, what: &str, mode: RoundingMode) -> EvalResult<Value> {
    match number(value, what)? {
        Number::Float(f) => {
            let rounded = if matches!(mode, RoundingMode::Floor) { f.floor() } else { f.ceil() };
            BigInt::from_f64(rounded).map(normalize)
                                     .ok_or_else(|| RuntimeError::arithmetic(format!("cannot round {f} to an integer")))
        },
        Number::Decimal(d) => Ok(normalize(d.with_scale_round(0, mode).into_bigint_and_exponent().0)),
        integral => Ok(integral.into_value()),
    }
}

/// Builds the `math` namespace.
pub(crate) fn namespace() -> Value {
    let mut members = IndexMap::new();
    for builtin in [Builtin::new("sqrt", Arity::Exact(1), "math.sqrt(x) is the square root of x", sqrt),
                    Builtin::new("floor", Arity::Exact(1), "math.floor(x) rounds x down to an integer", floor),
                    Builtin::new("ceil", Arity::Exact(1), "math.ceil(x) rounds x up to an integer", ceil)]
    {
        members.insert(builtin.name.clone(), Value::Builtin(Arc::new(builtin)));
    }
    members.insert("pi".to_string(), Value::Float(consts::PI));
    members.insert("e".to_string(), Value::Float(consts::E));

    Value::BuiltinObj(Arc::new(BuiltinObj { name: "math".to_string(),
                                            help: "math: sqrt, floor, ceil and the constants pi and e".to_string(),
                                            members }))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluator::core::Evaluator;

    #[test]
    fn rounding_gives_integers() {
        let mut evaluator = Evaluator::default();
        assert_eq!(evaluator.run("math.floor(-1.5)", "test").unwrap().as_i64(), Some(-2));
        assert_eq!(evaluator.run("math.ceil(1.2)", "test").unwrap().as_i64(), Some(2));
        assert_eq!(evaluator.run("math.floor(7)", "test").unwrap().as_i64(), Some(7));
    }

    #[test]
    fn sqrt_rejects_negative_input() {
        let mut evaluator = Evaluator::default();
        assert_eq!(evaluator.run("math.sqrt(16)", "test").unwrap().to_string(), "4.0");
        assert!(evaluator.run("math.sqrt(-1)", "test").is_err());
    }
}
