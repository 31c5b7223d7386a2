use std::sync::Arc;

use crate::{
    ast::InfixOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{binary::core::unknown, core::EvalResult},
        value::core::Value,
    },
};

/// Longest list a range literal may produce, and the longest list or
/// string (in bytes) repetition may build.
pub const MAX_RANGE_LEN: usize = 10_000_000;

/// String, list and map operators.
///
/// - `+` concatenates two strings or two lists and merges two maps (right
///   wins, left order kept).
/// - `*` repeats a string or list by a non-negative integer count, on either
///   side. A result longer than [`MAX_RANGE_LEN`] is a `RangeError`.
///
/// # Returns
/// `Ok(None)` if no rule applies.
pub fn eval_sequence(op: InfixOperator, left: &Value, right: &Value) -> EvalResult<Option<Value>> {
    Ok(Some(match (op, left, right) {
                (InfixOperator::Add, Value::String(a), Value::String(b)) => {
                    Value::from(format!("{a}{b}"))
                },
                (InfixOperator::Add, Value::List(a), Value::List(b)) => {
                    let mut items = a.snapshot();
                    items.extend(b.snapshot());
                    Value::from(items)
                },
                (InfixOperator::Add, Value::Map(a), Value::Map(b)) => {
                    let right = b.snapshot();
                    let merged = a.read().merged(&right);
                    Value::from(merged)
                },
                (InfixOperator::Mul, Value::String(s), count) | (InfixOperator::Mul, count, Value::String(s))
                    if count.as_i64().is_some() =>
                {
                    Value::from(s.repeat(repeat_count(count, s.len())?))
                },
                (InfixOperator::Mul, Value::List(items), count)
                | (InfixOperator::Mul, count, Value::List(items))
                    if count.as_i64().is_some() =>
                {
                    let items = items.snapshot();
                    let times = repeat_count(count, items.len())?;
                    let mut repeated = Vec::with_capacity(items.len() * times);
                    for _ in 0..times {
                        repeated.extend(items.iter().cloned());
                    }
                    Value::from(repeated)
                },
                _ => return Ok(None),
            }))
}

/// Validates a repeat count for a sequence of `unit` elements.
fn repeat_count(count: &Value, unit: usize) -> EvalResult<usize> {
    let count = count.expect_i64("repeat count")?;
    let times =
        usize::try_from(count).map_err(|_| RuntimeError::range(format!("repeat count must be non-negative, got {count}")))?;
    match unit.checked_mul(times) {
        Some(0) => Ok(0),
        Some(len) if len <= MAX_RANGE_LEN => Ok(times),
        _ => Err(RuntimeError::range(format!("repetition longer than {MAX_RANGE_LEN} elements"))),
    }
}

/// Implements `item in container`.
///
/// Strings test for a substring, lists for an equal element, sets for
/// membership, maps for a key and byte strings for a byte value.
///
/// # Errors
/// Returns a `TypeError` for a container that does not support `in`, a
/// non-string needle in a string, or an unhashable needle in a set or map.
///
/// # Example
/// ```
/// use blue::interpreter::{evaluator::binary::sequence::contains, value::core::Value};
///
/// assert!(contains(&Value::from("blue"), &Value::from("lu")).unwrap());
/// assert!(!contains(&Value::from(Vec::new()), &Value::Integer(1)).unwrap());
/// ```
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(&**needle)),
            _ => Err(unknown(item, InfixOperator::In, container)),
        },
        Value::List(items) => Ok(items.read().iter().any(|v| v.equals(item))),
        Value::Set(set) => set.read().contains(item),
        Value::Map(map) => map.read().contains_key(item),
        Value::Bytes(bytes) => {
            Ok(item.as_i64()
                   .and_then(|b| u8::try_from(b).ok())
                   .is_some_and(|b| bytes.contains(&b)))
        },
        _ => Err(unknown(item, InfixOperator::In, container)),
    }
}

/// Implements `a..b` and `a..<b`.
///
/// Integer bounds give a list of integers, single-character strings a list
/// of characters. The range counts down when the start is greater than the
/// end.
///
/// # Errors
/// Returns a `TypeError` for other operands and a `RangeError` for ranges
/// longer than [`MAX_RANGE_LEN`].
///
/// # Example
/// ```
/// use blue::interpreter::{evaluator::binary::sequence::range, value::core::Value};
///
/// let up = range(&Value::Integer(1), &Value::Integer(3), true).unwrap();
/// assert_eq!(up.to_string(), "[1, 2, 3]");
///
/// let down = range(&Value::from("c"), &Value::from("a"), false).unwrap();
/// assert_eq!(down.to_string(), "[c, b]");
/// ```
pub fn range(start: &Value, end: &Value, inclusive: bool) -> EvalResult<Value> {
    let op = if inclusive { InfixOperator::Range } else { InfixOperator::RangeExclusive };

    if let (Some(a), Some(b)) = (start.as_i64(), end.as_i64()) {
        let values = stepped(i128::from(a), i128::from(b), inclusive)?;
        return Ok(Value::from(values.into_iter()
                                    .filter_map(|v| i64::try_from(v).ok())
                                    .map(Value::Integer)
                                    .collect::<Vec<_>>()));
    }

    if let (Some(a), Some(b)) = (single_char(start), single_char(end)) {
        let values = stepped(i128::from(u32::from(a)), i128::from(u32::from(b)), inclusive)?;
        return Ok(Value::from(values.into_iter()
                                    .filter_map(|v| u32::try_from(v).ok().and_then(char::from_u32))
                                    .map(|c| Value::String(Arc::from(c.to_string())))
                                    .collect::<Vec<_>>()));
    }

    Err(unknown(start, op, end))
}

fn single_char(value: &Value) -> Option<char> {
    let mut chars = value.as_str()?.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn stepped(start: i128, end: i128, inclusive: bool) -> EvalResult<Vec<i128>> {
    let span = (end - start).unsigned_abs() + u128::from(inclusive);
    if span > MAX_RANGE_LEN as u128 {
        return Err(RuntimeError::range(format!("range of {span} elements is too long")));
    }
    let step = if end >= start { 1 } else { -1 };
    let mut values = Vec::new();
    let mut current = start;
    while values.len() as u128 != span {
        values.push(current);
        current += step;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_range_stops_before_the_end() {
        let v = range(&Value::Integer(0), &Value::Integer(3), false).unwrap();
        assert_eq!(v.to_string(), "[0, 1, 2]");
        let empty = range(&Value::Integer(2), &Value::Integer(2), false).unwrap();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn descending_ranges() {
        let v = range(&Value::Integer(3), &Value::Integer(1), true).unwrap();
        assert_eq!(v.to_string(), "[3, 2, 1]");
    }

    #[test]
    fn repetition() {
        let v = eval_sequence(InfixOperator::Mul, &Value::from("ab"), &Value::Integer(3)).unwrap()
                                                                                        .unwrap();
        assert_eq!(v.as_str(), Some("ababab"));
        assert!(eval_sequence(InfixOperator::Mul, &Value::from("ab"), &Value::Integer(-1)).is_err());
    }

    #[test]
    fn oversized_repetition_is_a_range_error() {
        let list = Value::from(vec![Value::Integer(1), Value::Integer(2)]);
        for sequence in [list, Value::from("ab")] {
            let error = eval_sequence(InfixOperator::Mul, &sequence, &Value::Integer(i64::MAX)).unwrap_err();
            assert_eq!(error.kind, crate::error::ErrorKind::Range);
        }
        let empty = eval_sequence(InfixOperator::Mul, &Value::from(Vec::new()), &Value::Integer(i64::MAX)).unwrap()
                                                                                                        .unwrap();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn membership_in_empty_collections_is_false() {
        assert!(!contains(&Value::from(Vec::new()), &Value::Integer(0)).unwrap());
    }
}
