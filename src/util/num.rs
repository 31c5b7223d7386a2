use std::{str::FromStr, time::Duration};

use bigdecimal::BigDecimal;

use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Converts a finite `f64` into the decimal with the same shortest
/// round-trip text.
///
/// ## Errors
/// Returns an `ArithmeticError` for NaN and infinities, which have no
/// decimal form.
///
/// ## Example
/// ```
/// use std::str::FromStr;
///
/// use bigdecimal::BigDecimal;
/// use blue::util::num::decimal_from_f64;
///
/// assert_eq!(decimal_from_f64(0.1).unwrap(), BigDecimal::from_str("0.1").unwrap());
/// assert!(decimal_from_f64(f64::NAN).is_err());
/// ```
pub fn decimal_from_f64(value: f64) -> EvalResult<BigDecimal> {
    if !value.is_finite() {
        return Err(RuntimeError::arithmetic(format!("cannot convert {value} to a decimal")));
    }
    BigDecimal::from_str(&value.to_string()).map_err(|e| RuntimeError::arithmetic(e.to_string()))
}

/// Truncates a finite `f64` toward zero and converts it to `i64`.
///
/// ## Errors
/// Returns an `ArithmeticError` if the value is not finite or does not fit.
///
/// ## Example
/// ```
/// use blue::util::num::f64_to_i64_checked;
///
/// assert_eq!(f64_to_i64_checked(-3.9).unwrap(), -3);
/// assert!(f64_to_i64_checked(1e300).is_err());
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn f64_to_i64_checked(value: f64) -> EvalResult<i64> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(RuntimeError::arithmetic(format!("{value} does not fit in a 64-bit integer")));
    }
    Ok(truncated as i64)
}

/// Converts a length or count to `i64`, saturating at `i64::MAX`.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Resolves a possibly negative index against a sequence of length `len`.
///
/// `-1` is the last element. Returns `None` if the index is out of bounds.
///
/// ## Example
/// ```
/// use blue::util::num::resolve_index;
///
/// assert_eq!(resolve_index(-1, 3), Some(2));
/// assert_eq!(resolve_index(3, 3), None);
/// assert_eq!(resolve_index(-4, 3), None);
/// ```
#[must_use]
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = usize_to_i64(len);
    let resolved = if index < 0 { index.checked_add(len)? } else { index };
    if (0..len).contains(&resolved) { usize::try_from(resolved).ok() } else { None }
}

/// Clamps a possibly negative slice bound into `0..=len`.
#[must_use]
pub fn clamp_bound(bound: i64, len: usize) -> usize {
    let len_i = usize_to_i64(len);
    let resolved = if bound < 0 { bound.saturating_add(len_i) } else { bound };
    usize::try_from(resolved.clamp(0, len_i)).unwrap_or(len)
}

/// Converts a millisecond count into a [`Duration`].
///
/// ## Errors
/// Returns an `ArithmeticError` for negative counts.
pub fn millis(ms: i64) -> EvalResult<Duration> {
    u64::try_from(ms).map(Duration::from_millis)
                     .map_err(|_| RuntimeError::arithmetic(format!("negative duration: {ms}ms")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_clamp_to_length() {
        assert_eq!(clamp_bound(-1, 4), 3);
        assert_eq!(clamp_bound(10, 4), 4);
        assert_eq!(clamp_bound(-10, 4), 0);
    }

    #[test]
    fn negative_millis_are_rejected() {
        assert!(millis(-5).is_err());
        assert_eq!(millis(5).unwrap(), Duration::from_millis(5));
    }
}
