use std::{str::FromStr, sync::Arc};

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{
            collection::SetValue,
            core::Value,
            function::Arguments,
            numeric::{Number, normalize},
        },
    },
    util::num::f64_to_i64_checked,
};

/// `str(x)`: the display form of `x`.
pub fn str(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.to_string()))
}

/// `inspect(x)`: the printable form of `x`, as used by string
/// interpolation.
pub fn inspect(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.inspect()))
}

/// Converts a value to an integer.
///
/// Floats and decimals are truncated toward zero. Strings are parsed in the
/// given base (default 10, `2..=36`); underscores are ignored. Results
/// outside the 64-bit range become big integers.
///
/// # Errors
/// - `RangeError` for a base outside `2..=36`.
/// - `TypeError` for values with no integer form and unparsable strings.
/// - `ArithmeticError` for NaN and infinite floats.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run("int(-3.9)", "main").unwrap().as_i64(), Some(-3));
/// assert_eq!(evaluator.run(r#"int("ff", 16)"#, "main").unwrap().as_i64(), Some(255));
/// assert_eq!(evaluator.run(r#"int("1_000")"#, "main").unwrap().as_i64(), Some(1000));
/// ```
pub fn int(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let base = match args.get(1) {
        Some(base) => base.expect_i64("base")?,
        None => 10,
    };
    let radix = u32::try_from(base).ok()
                                   .filter(|b| (2..=36).contains(b))
                                   .ok_or_else(|| RuntimeError::range(format!("int() base must be between 2 and 36, got {base}")))?;

    match args.at(0)? {
        Value::String(s) => parse_int(s, radix),
        _ if args.len() == 2 => Err(RuntimeError::type_error("int() with a base requires a STRING")),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::Float(f) if f.is_finite() && f.abs() >= 9.2e18 => {
            BigInt::from_f64(f.trunc()).map(normalize)
                                       .ok_or_else(|| RuntimeError::arithmetic(format!("cannot convert {f} to an integer")))
        },
        Value::Float(f) => Ok(Value::Integer(f64_to_i64_checked(*f)?)),
        Value::BigFloat(d) => Ok(truncate(d)),
        Value::UInteger(u) => Ok(normalize(BigInt::from(*u))),
        value @ (Value::Integer(_) | Value::BigInteger(_)) => Ok(value.clone()),
        other => Err(RuntimeError::type_error(format!("cannot convert {} to an integer", other.type_name()))),
    }
}

fn parse_int(text: &str, radix: u32) -> EvalResult<Value> {
    let digits = text.trim().replace('_', "");
    let unsigned = digits.strip_prefix(['+', '-']).unwrap_or(&digits);
    if unsigned.is_empty() {
        return Err(RuntimeError::type_error(format!("invalid integer literal: {text:?}")));
    }
    if let Ok(i) = i64::from_str_radix(&digits, radix) {
        return Ok(Value::Integer(i));
    }
    BigInt::parse_bytes(digits.as_bytes(), radix).map(normalize)
                                                 .ok_or_else(|| RuntimeError::type_error(format!("invalid integer literal: {text:?}")))
}

fn truncate(value: &BigDecimal) -> Value {
    let (digits, _) = value.with_scale_round(0, RoundingMode::Down).into_bigint_and_exponent();
    normalize(digits)
}

/// `float(x)`: the nearest 64-bit float.
///
/// # Errors
/// Returns a `TypeError` for non-numeric values and unparsable strings.
pub fn float(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::String(s) => {
            let text = s.trim().replace('_', "");
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| RuntimeError::type_error(format!("invalid float literal: {s:?}")))
        },
        Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        other => {
            Number::from_value(other).map(|n| Value::Float(n.to_f64()))
                                     .ok_or_else(|| RuntimeError::type_error(format!("cannot convert {} to a float",
                                                                                     other.type_name())))
        },
    }
}

/// `uint(x)`: converts a non-negative number or numeric string to an
/// unsigned integer.
///
/// # Errors
/// Returns a `RangeError` for negative values or values above `u64::MAX`,
/// and a `TypeError` for anything else that is not a number.
pub fn uint(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let value = args.at(0)?;
    let integer = match value {
        Value::String(s) => parse_int(s, 10)?,
        Value::Boolean(b) => Value::Integer(i64::from(*b)),
        other => {
            let number = Number::from_value(other).ok_or_else(|| {
                                                      RuntimeError::type_error(format!("cannot convert {} to an unsigned integer",
                                                                                       other.type_name()))
                                                  })?;
            match number {
                Number::Float(f) if !f.is_finite() => {
                    return Err(RuntimeError::arithmetic(format!("cannot convert {f} to an integer")));
                },
                Number::Float(f) => BigInt::from_f64(f.trunc()).map_or(Value::Integer(0), normalize),
                Number::Decimal(d) => truncate(&d),
                number => number.into_value(),
            }
        },
    };

    let big = match &integer {
        Value::Integer(i) => BigInt::from(*i),
        Value::UInteger(u) => BigInt::from(*u),
        Value::BigInteger(b) => (**b).clone(),
        _ => BigInt::default(),
    };
    big.to_u64()
       .map(Value::UInteger)
       .ok_or_else(|| RuntimeError::range(format!("{value} is out of range for an unsigned integer")))
}

/// `bigint(x)`: converts to an arbitrary-precision integer.
///
/// Values that fit in 64 bits are kept as plain integers.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let v = evaluator.run(r#"bigint("123456789012345678901234567890")"#, "main").unwrap();
/// assert_eq!(v.to_string(), "123456789012345678901234567890");
/// assert_eq!(evaluator.run("type(bigint(5))", "main").unwrap().as_str(), Some("INTEGER"));
/// ```
pub fn bigint(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::String(s) => parse_int(s, 10),
        Value::BigFloat(d) => Ok(truncate(d)),
        Value::Float(f) => {
            BigInt::from_f64(f.trunc()).map(normalize)
                                       .ok_or_else(|| RuntimeError::arithmetic(format!("cannot convert {f} to an integer")))
        },
        other => {
            Number::from_value(other).and_then(|n| n.to_bigint())
                                     .map(normalize)
                                     .ok_or_else(|| RuntimeError::type_error(format!("cannot convert {} to an integer",
                                                                                     other.type_name())))
        },
    }
}

/// `bigfloat(x)`: converts to an arbitrary-precision decimal.
///
/// Floats convert through their shortest round-trip text, so
/// `bigfloat(0.1)` is exactly `0.1`.
///
/// # Errors
/// Returns an `ArithmeticError` for NaN and infinities and a `TypeError`
/// for non-numeric values.
pub fn bigfloat(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let decimal = match args.at(0)? {
        Value::String(s) => {
            BigDecimal::from_str(&s.trim().replace('_', "")).map_err(|_| {
                                                                RuntimeError::type_error(format!("invalid decimal literal: {s:?}"))
                                                            })?
        },
        other => {
            Number::from_value(other).ok_or_else(|| {
                                         RuntimeError::type_error(format!("cannot convert {} to a decimal",
                                                                          other.type_name()))
                                     })?
                                     .to_decimal()?
        },
    };
    Ok(Value::BigFloat(Arc::new(decimal)))
}

/// `bytes(x)`: the UTF-8 bytes of a string, or the bytes listed as
/// integers in `0..=255`.
///
/// # Errors
/// Returns a `RangeError` for list elements outside a byte and a
/// `TypeError` for other values.
pub fn bytes(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::String(s) => Ok(Value::Bytes(Arc::from(s.as_bytes()))),
        Value::Bytes(b) => Ok(Value::Bytes(Arc::clone(b))),
        Value::List(items) => {
            let bytes = items.read()
                             .iter()
                             .map(|item| {
                                 let i = item.expect_i64("byte")?;
                                 u8::try_from(i).map_err(|_| RuntimeError::range(format!("byte out of range: {i}")))
                             })
                             .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::Bytes(Arc::from(bytes)))
        },
        other => Err(RuntimeError::type_error(format!("cannot convert {} to bytes", other.type_name()))),
    }
}

/// The elements `list(x)` and `set(x)` collect: list and set elements,
/// map keys, characters and byte values.
pub(crate) fn elements(value: &Value) -> EvalResult<Vec<Value>> {
    Ok(match value {
           Value::List(items) => items.read().clone(),
           Value::Set(set) => set.read().iter().cloned().collect(),
           Value::Map(map) => map.read().keys(),
           Value::String(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
           Value::Bytes(b) => b.iter().map(|&byte| Value::Integer(i64::from(byte))).collect(),
           other => return Err(RuntimeError::type_error(format!("cannot iterate over {}", other.type_name()))),
       })
}

/// `list(x)`: a new list of the elements of `x`.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run(r#"list("ab")"#, "main").unwrap().to_string(), "[a, b]");
/// assert_eq!(evaluator.run("list({x: 1, y: 2})", "main").unwrap().to_string(), "[x, y]");
/// ```
pub fn list(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(elements(args.at(0)?)?))
}

/// `set(x)`: a new set of the elements of `x`; `set()` is empty.
///
/// # Errors
/// Returns a `TypeError` for unhashable elements.
pub fn set(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let values = match args.get(0) {
        Some(value) => elements(value)?,
        None => Vec::new(),
    };
    Ok(Value::from(SetValue::from_values(values)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_and_big_integers() {
        assert_eq!(parse_int("-42", 10).unwrap().as_i64(), Some(-42));
        assert!(matches!(parse_int("99999999999999999999", 10).unwrap(), Value::BigInteger(_)));
        assert!(parse_int("12x", 10).is_err());
        assert!(parse_int("-", 10).is_err());
    }

    #[test]
    fn truncates_decimals_toward_zero() {
        let d = BigDecimal::from_str("-7.9").unwrap();
        assert_eq!(truncate(&d).as_i64(), Some(-7));
    }
}
