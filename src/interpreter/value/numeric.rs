use std::{cmp::Ordering, sync::Arc};

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, ToBigInt};
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use crate::{
    ast::InfixOperator,
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
    util::num::decimal_from_f64,
};

/// A numeric operand lifted out of a [`Value`].
///
/// Every arithmetic operator goes through this type: the two operands are
/// promoted to a common domain, the operation is carried out there, and the
/// result is turned back into a value. Results in the integer domain are
/// normalized, so a big integer that fits in 64 bits becomes an `Integer`.
#[derive(Debug, Clone)]
pub enum Number {
    /// `Integer`
    Int(i64),
    /// `UInteger`
    UInt(u64),
    /// `BigInteger`
    Big(BigInt),
    /// `Float`
    Float(f64),
    /// `BigFloat`
    Decimal(BigDecimal),
}

/// Two operands after promotion.
enum Pair {
    Small(i64, i64),
    Unsigned(u64, u64),
    Big(BigInt, BigInt),
    Float(f64, f64),
    Decimal(BigDecimal, BigDecimal),
}

impl Number {
    /// Extracts the numeric payload of `value`, if it is a number.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
                 Value::Integer(i) => Self::Int(*i),
                 Value::UInteger(u) => Self::UInt(*u),
                 Value::BigInteger(b) => Self::Big((**b).clone()),
                 Value::Float(f) => Self::Float(*f),
                 Value::BigFloat(d) => Self::Decimal((**d).clone()),
                 _ => return None,
             })
    }

    /// Turns the number back into a value, normalizing big integers.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Integer(i),
            Self::UInt(u) => Value::UInteger(u),
            Self::Big(b) => normalize(b),
            Self::Float(f) => Value::Float(f),
            Self::Decimal(d) => Value::BigFloat(Arc::new(d)),
        }
    }

    /// The exact integer value, for integral numbers. Floats and decimals
    /// qualify when they have no fractional part.
    #[must_use]
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Self::Int(i) => Some(BigInt::from(*i)),
            Self::UInt(u) => Some(BigInt::from(*u)),
            Self::Big(b) => Some(b.clone()),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => BigInt::from_f64(*f),
            Self::Decimal(d) if d.is_integer() => d.to_bigint(),
            Self::Float(_) | Self::Decimal(_) => None,
        }
    }

    /// The nearest `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::UInt(u) => *u as f64,
            Self::Big(b) => b.to_f64().unwrap_or(f64::NAN),
            Self::Float(f) => *f,
            Self::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// The exact decimal value.
    ///
    /// # Errors
    /// Returns an `ArithmeticError` for NaN and infinite floats.
    pub fn to_decimal(&self) -> EvalResult<BigDecimal> {
        Ok(match self {
               Self::Int(i) => BigDecimal::from(*i),
               Self::UInt(u) => BigDecimal::from(*u),
               Self::Big(b) => BigDecimal::from(b.clone()),
               Self::Float(f) => decimal_from_f64(*f)?,
               Self::Decimal(d) => d.clone(),
           })
    }

    /// Returns `true` for any representation of zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(i) => *i == 0,
            Self::UInt(u) => *u == 0,
            Self::Big(b) => b.is_zero(),
            Self::Float(f) => *f == 0.0,
            Self::Decimal(d) => d.is_zero(),
        }
    }

    /// Returns `true` if the number is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Int(i) => *i < 0,
            Self::UInt(_) => false,
            Self::Big(b) => b.is_negative(),
            Self::Float(f) => *f < 0.0,
            Self::Decimal(d) => d.is_negative(),
        }
    }

    fn to_u64(&self) -> Option<u64> {
        match self {
            Self::Int(i) => u64::try_from(*i).ok(),
            Self::UInt(u) => Some(*u),
            Self::Big(b) => b.to_u64(),
            Self::Float(_) | Self::Decimal(_) => None,
        }
    }

    const fn is_integral_kind(&self) -> bool {
        matches!(self, Self::Int(_) | Self::UInt(_) | Self::Big(_))
    }

    fn into_bigint(self) -> BigInt {
        match self {
            Self::Int(i) => BigInt::from(i),
            Self::UInt(u) => BigInt::from(u),
            Self::Big(b) => b,
            other => other.to_bigint().unwrap_or_default(),
        }
    }
}

/// Converts a big integer into the narrowest integer value.
///
/// # Example
/// ```
/// use blue::interpreter::value::{core::Value, numeric::normalize};
/// use num_bigint::BigInt;
///
/// assert!(matches!(normalize(BigInt::from(7)), Value::Integer(7)));
/// assert!(matches!(normalize(BigInt::from(u64::MAX)), Value::BigInteger(_)));
/// ```
#[must_use]
pub fn normalize(value: BigInt) -> Value {
    match i64::try_from(&value) {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::BigInteger(Arc::new(value)),
    }
}

fn decimal(value: BigDecimal) -> Value {
    Value::BigFloat(Arc::new(value))
}

fn promote(left: Number, right: Number) -> EvalResult<Pair> {
    use Number::{Big, Decimal, Float, Int, UInt};

    Ok(match (left, right) {
           (Int(a), Int(b)) => Pair::Small(a, b),
           (UInt(a), UInt(b)) => Pair::Unsigned(a, b),
           (l @ Decimal(_), r) | (l, r @ Decimal(_)) => {
               Pair::Decimal(l.to_decimal()?, r.to_decimal()?)
           },
           (l @ Float(_), r @ Big(_)) | (l @ Big(_), r @ Float(_)) => {
               Pair::Decimal(l.to_decimal()?, r.to_decimal()?)
           },
           (Float(a), r) => Pair::Float(a, r.to_f64()),
           (l, Float(b)) => Pair::Float(l.to_f64(), b),
           (l, r) => Pair::Big(l.into_bigint(), r.into_bigint()),
       })
}

fn division_guard(is_zero: bool) -> EvalResult<()> {
    if is_zero { Err(RuntimeError::division_by_zero()) } else { Ok(()) }
}

/// Applies an arithmetic operator (`+ - * / // % **`) to two numbers.
///
/// # Errors
/// Returns an `ArithmeticError` on division by zero (except float `/`,
/// which follows IEEE rules), for exponents that do not fit in 32 bits, and
/// when a non-finite float meets a big number.
///
/// # Example
/// ```
/// use blue::{
///     ast::InfixOperator,
///     interpreter::value::{core::Value, numeric::{Number, arithmetic}},
/// };
///
/// let sum = arithmetic(InfixOperator::Add, Number::Int(i64::MAX), Number::Int(1)).unwrap();
/// assert!(matches!(sum, Value::BigInteger(_)));
///
/// let quotient = arithmetic(InfixOperator::Div, Number::Int(7), Number::Int(2)).unwrap();
/// assert!(matches!(quotient, Value::Integer(3)));
/// ```
pub fn arithmetic(op: InfixOperator, left: Number, right: Number) -> EvalResult<Value> {
    match promote(left, right)? {
        Pair::Small(a, b) => small(op, a, b),
        Pair::Unsigned(a, b) => unsigned(op, a, b),
        Pair::Big(a, b) => big(op, a, b),
        Pair::Float(a, b) => float(op, a, b),
        Pair::Decimal(a, b) => decimal_arithmetic(op, a, b),
    }
}

fn small(op: InfixOperator, a: i64, b: i64) -> EvalResult<Value> {
    let checked = match op {
        InfixOperator::Add => a.checked_add(b),
        InfixOperator::Sub => a.checked_sub(b),
        InfixOperator::Mul => a.checked_mul(b),
        InfixOperator::Div => {
            division_guard(b == 0)?;
            a.checked_div(b)
        },
        InfixOperator::FloorDiv => {
            division_guard(b == 0)?;
            if a == i64::MIN && b == -1 { None } else { Some(Integer::div_floor(&a, &b)) }
        },
        InfixOperator::Mod => {
            division_guard(b == 0)?;
            a.checked_rem_euclid(b)
        },
        InfixOperator::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        _ => return Err(RuntimeError::unknown_operator("INTEGER", op, "INTEGER")),
    };

    match checked {
        Some(value) => Ok(Value::Integer(value)),
        None => big(op, BigInt::from(a), BigInt::from(b)),
    }
}

fn unsigned(op: InfixOperator, a: u64, b: u64) -> EvalResult<Value> {
    let checked = match op {
        InfixOperator::Add => a.checked_add(b),
        InfixOperator::Sub => a.checked_sub(b),
        InfixOperator::Mul => a.checked_mul(b),
        InfixOperator::Div | InfixOperator::FloorDiv => {
            division_guard(b == 0)?;
            Some(a / b)
        },
        InfixOperator::Mod => {
            division_guard(b == 0)?;
            Some(a % b)
        },
        InfixOperator::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        _ => return Err(RuntimeError::unknown_operator("UINTEGER", op, "UINTEGER")),
    };

    match checked {
        Some(value) => Ok(Value::UInteger(value)),
        None => big(op, BigInt::from(a), BigInt::from(b)),
    }
}

fn big(op: InfixOperator, a: BigInt, b: BigInt) -> EvalResult<Value> {
    Ok(match op {
           InfixOperator::Add => normalize(a + b),
           InfixOperator::Sub => normalize(a - b),
           InfixOperator::Mul => normalize(a * b),
           InfixOperator::Div => {
               division_guard(b.is_zero())?;
               normalize(a / b)
           },
           InfixOperator::FloorDiv => {
               division_guard(b.is_zero())?;
               normalize(Integer::div_floor(&a, &b))
           },
           InfixOperator::Mod => {
               division_guard(b.is_zero())?;
               let remainder = a % &b;
               if remainder.is_negative() {
                   normalize(remainder + b.abs())
               } else {
                   normalize(remainder)
               }
           },
           InfixOperator::Pow => return big_pow(&a, &b),
           _ => return Err(RuntimeError::unknown_operator("BIG_INTEGER", op, "BIG_INTEGER")),
       })
}

fn big_pow(base: &BigInt, exponent: &BigInt) -> EvalResult<Value> {
    if exponent.is_negative() {
        let base = base.to_f64().unwrap_or(f64::NAN);
        let exponent = exponent.to_f64().unwrap_or(f64::NAN);
        return Ok(Value::Float(base.powf(exponent)));
    }
    let exponent = exponent.to_u32()
                           .ok_or_else(|| RuntimeError::arithmetic("exponent is too large"))?;
    Ok(normalize(base.pow(exponent)))
}

fn float(op: InfixOperator, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        InfixOperator::Add => a + b,
        InfixOperator::Sub => a - b,
        InfixOperator::Mul => a * b,
        InfixOperator::Div => a / b,
        InfixOperator::FloorDiv => {
            division_guard(b == 0.0)?;
            (a / b).floor()
        },
        InfixOperator::Mod => {
            division_guard(b == 0.0)?;
            a.rem_euclid(b)
        },
        InfixOperator::Pow => a.powf(b),
        _ => return Err(RuntimeError::unknown_operator("FLOAT", op, "FLOAT")),
    };
    Ok(Value::Float(result))
}

fn decimal_arithmetic(op: InfixOperator, a: BigDecimal, b: BigDecimal) -> EvalResult<Value> {
    Ok(match op {
           InfixOperator::Add => decimal(a + b),
           InfixOperator::Sub => decimal(a - b),
           InfixOperator::Mul => decimal(a * b),
           InfixOperator::Div => {
               division_guard(b.is_zero())?;
               decimal(a / b)
           },
           InfixOperator::FloorDiv => {
               division_guard(b.is_zero())?;
               decimal((a / b).with_scale_round(0, RoundingMode::Floor))
           },
           InfixOperator::Mod => {
               division_guard(b.is_zero())?;
               let remainder = a % b.clone();
               if remainder.is_negative() {
                   decimal(remainder + b.abs())
               } else {
                   decimal(remainder)
               }
           },
           InfixOperator::Pow => return decimal_pow(&a, &b),
           _ => return Err(RuntimeError::unknown_operator("BIG_FLOAT", op, "BIG_FLOAT")),
       })
}

/// Raises a decimal to an integral power by repeated squaring; other
/// exponents fall back to `f64`.
fn decimal_pow(base: &BigDecimal, exponent: &BigDecimal) -> EvalResult<Value> {
    let Some(exponent) = exponent.is_integer().then(|| exponent.to_i64()).flatten() else {
        let base = base.to_f64().unwrap_or(f64::NAN);
        let exponent = exponent.to_f64().unwrap_or(f64::NAN);
        return Ok(Value::Float(base.powf(exponent)));
    };

    let mut remaining = exponent.unsigned_abs();
    let mut square = base.clone();
    let mut result = BigDecimal::one();
    while remaining > 0 {
        if remaining & 1 == 1 {
            result *= &square;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = &square * &square;
        }
    }

    if exponent < 0 {
        division_guard(result.is_zero())?;
        result = BigDecimal::one() / result;
    }
    Ok(decimal(result))
}

/// Exact numeric equality across the whole tower.
///
/// Integral values compare by their exact integer value, so `2 == 2.0` and
/// `0u2 == 2`; non-integral floats compare with decimals through their
/// shortest decimal form. NaN equals nothing.
#[must_use]
pub fn numeric_eq(left: &Number, right: &Number) -> bool {
    use Number::{Decimal, Float, Int};

    match (left, right) {
        (Int(a), Int(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (Float(f), Decimal(d)) | (Decimal(d), Float(f)) => {
            decimal_from_f64(*f).is_ok_and(|x| &x == d)
        },
        (Float(f), other) | (other, Float(f)) => {
            f.is_finite() && f.fract() == 0.0 && BigInt::from_f64(*f) == other.to_bigint()
        },
        (Decimal(d), other) | (other, Decimal(d)) => {
            other.to_decimal().is_ok_and(|x| &x == d)
        },
        (a, b) => a.to_bigint() == b.to_bigint(),
    }
}

/// Orders two numbers after promotion. `None` when a NaN is involved.
///
/// # Errors
/// Never fails for finite operands; kept fallible so every numeric helper
/// shares one signature.
pub fn compare(left: Number, right: Number) -> EvalResult<Option<Ordering>> {
    let non_finite = |n: &Number| matches!(n, Number::Float(f) if !f.is_finite());
    if non_finite(&left) || non_finite(&right) {
        return Ok(left.to_f64().partial_cmp(&right.to_f64()));
    }

    Ok(match promote(left, right)? {
           Pair::Small(a, b) => Some(a.cmp(&b)),
           Pair::Unsigned(a, b) => Some(a.cmp(&b)),
           Pair::Big(a, b) => Some(a.cmp(&b)),
           Pair::Float(a, b) => a.partial_cmp(&b),
           Pair::Decimal(a, b) => Some(a.cmp(&b)),
       })
}

/// `-x`
#[must_use]
pub fn negate(number: Number) -> Value {
    match number {
        Number::Int(i) => i.checked_neg()
                           .map_or_else(|| normalize(-BigInt::from(i)), Value::Integer),
        Number::UInt(u) => normalize(-BigInt::from(u)),
        Number::Big(b) => normalize(-b),
        Number::Float(f) => Value::Float(-f),
        Number::Decimal(d) => decimal(-d),
    }
}

/// `~x`: the 64-bit complement of an unsigned value, `-x - 1` otherwise.
#[must_use]
pub fn bit_not(number: Number) -> Option<Value> {
    match number {
        Number::UInt(u) => Some(Value::UInteger(!u)),
        Number::Int(i) => Some(Value::Integer(!i)),
        Number::Big(b) => Some(normalize(-b - 1)),
        Number::Float(_) | Number::Decimal(_) => None,
    }
}

/// Applies `&`, `|`, `^`, `<<` or `>>` to two integral numbers.
///
/// Bitwise operators work in the unsigned domain: signed operands take part
/// only when non-negative, and a result that fits in 64 bits is a
/// `UInteger`. Wider results stay exact as big integers.
///
/// Returns `Ok(None)` if either operand is not integral.
///
/// # Errors
/// Returns an `ArithmeticError` for a negative operand, or for a shift
/// amount that is not a 32-bit unsigned integer.
pub fn bitwise(op: InfixOperator, left: Number, right: Number) -> EvalResult<Option<Value>> {
    if !left.is_integral_kind() || !right.is_integral_kind() {
        return Ok(None);
    }
    if left.is_negative() || right.is_negative() {
        return Err(RuntimeError::arithmetic(format!("bitwise {op} needs non-negative operands")));
    }

    if matches!(op, InfixOperator::Shl | InfixOperator::Shr) {
        return shift(op, left, right).map(Some);
    }

    if let (Some(a), Some(b)) = (left.to_u64(), right.to_u64()) {
        return Ok(Some(Value::UInteger(apply_bits(op, a, b))));
    }

    let (a, b) = (left.into_bigint(), right.into_bigint());
    let result = match op {
        InfixOperator::BitAnd => a & b,
        InfixOperator::BitOr => a | b,
        _ => a ^ b,
    };
    Ok(Some(unsigned_big(result)))
}

const fn apply_bits(op: InfixOperator, a: u64, b: u64) -> u64 {
    match op {
        InfixOperator::BitAnd => a & b,
        InfixOperator::BitOr => a | b,
        _ => a ^ b,
    }
}

/// A non-negative integer as a `UInteger` when it fits, a big integer
/// otherwise.
fn unsigned_big(value: BigInt) -> Value {
    value.to_u64().map_or_else(|| normalize(value), Value::UInteger)
}

fn shift(op: InfixOperator, value: Number, amount: Number) -> EvalResult<Value> {
    let amount = amount.to_u64()
                       .and_then(|a| u32::try_from(a).ok())
                       .ok_or_else(|| RuntimeError::arithmetic("shift amount must be a non-negative 32-bit integer"))?;

    if op == InfixOperator::Shr {
        if let Some(u) = value.to_u64() {
            return Ok(Value::UInteger(u.checked_shr(amount).unwrap_or(0)));
        }
        return Ok(unsigned_big(value.into_bigint() >> amount));
    }
    Ok(unsigned_big(value.into_bigint() << amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitwise_results_are_unsigned() {
        let v = bitwise(InfixOperator::BitAnd, Number::Int(5), Number::Int(3)).unwrap().unwrap();
        assert!(matches!(v, Value::UInteger(1)));
        let v = bitwise(InfixOperator::BitXor, Number::UInt(6), Number::Int(3)).unwrap().unwrap();
        assert!(matches!(v, Value::UInteger(5)));
        let v = bitwise(InfixOperator::Shl, Number::Int(1), Number::Int(70)).unwrap().unwrap();
        assert!(matches!(v, Value::BigInteger(_)));
        let v = bitwise(InfixOperator::Shr, Number::UInt(u64::MAX), Number::Int(70)).unwrap().unwrap();
        assert!(matches!(v, Value::UInteger(0)));
    }

    #[test]
    fn bitwise_rejects_negative_operands() {
        for op in [InfixOperator::BitAnd, InfixOperator::BitOr, InfixOperator::Shl] {
            let error = bitwise(op, Number::Int(-5), Number::Int(3)).unwrap_err();
            assert_eq!(error.kind, crate::error::ErrorKind::Arithmetic);
        }
        assert!(bitwise(InfixOperator::Shl, Number::Int(1), Number::Int(-1)).is_err());
    }

    #[test]
    fn integer_overflow_promotes() {
        let v = arithmetic(InfixOperator::Mul, Number::Int(i64::MAX), Number::Int(2)).unwrap();
        assert!(matches!(v, Value::BigInteger(_)));
    }

    #[test]
    fn min_divided_by_minus_one_promotes() {
        let v = arithmetic(InfixOperator::Div, Number::Int(i64::MIN), Number::Int(-1)).unwrap();
        assert_eq!(v.to_string(), "9223372036854775808");
    }

    #[test]
    fn modulus_is_euclidean() {
        let v = arithmetic(InfixOperator::Mod, Number::Int(-7), Number::Int(3)).unwrap();
        assert!(matches!(v, Value::Integer(2)));
        let v = arithmetic(InfixOperator::Mod, Number::Int(7), Number::Int(-3)).unwrap();
        assert!(matches!(v, Value::Integer(1)));
    }

    #[test]
    fn unsigned_underflow_goes_signed() {
        let v = arithmetic(InfixOperator::Sub, Number::UInt(1), Number::UInt(2)).unwrap();
        assert!(matches!(v, Value::Integer(-1)));
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let v = arithmetic(InfixOperator::Div, Number::Float(1.0), Number::Float(0.0)).unwrap();
        assert!(matches!(v, Value::Float(f) if f.is_infinite()));
        assert!(arithmetic(InfixOperator::Div, Number::Int(1), Number::Int(0)).is_err());
    }

    #[test]
    fn equality_is_exact_across_kinds() {
        assert!(numeric_eq(&Number::Int(2), &Number::Float(2.0)));
        assert!(numeric_eq(&Number::UInt(2), &Number::Int(2)));
        assert!(!numeric_eq(&Number::Int(9_007_199_254_740_993),
                            &Number::Float(9_007_199_254_740_992.0)));
    }
}
