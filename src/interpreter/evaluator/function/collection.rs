use std::{cmp::Ordering, sync::Arc};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::sequence::{self, MAX_RANGE_LEN},
            core::{EvalResult, Evaluator},
            function::convert::elements,
        },
        value::{
            core::{NULL, Value},
            function::Arguments,
            numeric::{Number, compare},
        },
    },
    util::num::{resolve_index, usize_to_i64},
};

/// `len(x)`: elements of a list, map or set, characters of a string, bytes
/// of a byte string.
///
/// # Errors
/// Returns a `TypeError` for values without a length.
pub fn len(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let len = match args.at(0)? {
        Value::List(items) => items.read().len(),
        Value::Map(map) => map.read().len(),
        Value::Set(set) => set.read().len(),
        Value::String(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        other => return Err(RuntimeError::type_error(format!("{} has no length", other.type_name()))),
    };
    Ok(Value::Integer(usize_to_i64(len)))
}

/// `keys(m)`: the keys of a map in insertion order.
pub fn keys(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::Map(map) => Ok(Value::from(map.read().keys())),
        other => Err(RuntimeError::type_error(format!("keys() expects a MAP, got {}", other.type_name()))),
    }
}

/// `values(m)`: the values of a map in insertion order.
pub fn values(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::Map(map) => Ok(Value::from(map.read().values())),
        other => Err(RuntimeError::type_error(format!("values() expects a MAP, got {}", other.type_name()))),
    }
}

/// Appends values to a list in place and returns the list.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let v = evaluator.run("var xs = [1]; push(xs, 2, 3); xs", "main").unwrap();
/// assert_eq!(v.to_string(), "[1, 2, 3]");
///
/// // the first argument must not be an immutable binding
/// assert!(evaluator.run("val ys = []; push(ys, 1)", "main").is_err());
/// ```
pub fn push(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let Arguments { mut positional, .. } = args;
    let rest = positional.split_off(1);
    let target = positional.swap_remove(0);
    match &target {
        Value::List(items) => items.write().extend(rest),
        other => return Err(RuntimeError::type_error(format!("push() expects a LIST, got {}", other.type_name()))),
    }
    Ok(target)
}

/// `pop(list, index = -1)`: removes and returns an element.
///
/// # Errors
/// Returns a `RangeError` for an empty list or an index out of bounds.
pub fn pop(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let Value::List(items) = args.at(0)? else {
        return Err(RuntimeError::type_error(format!("pop() expects a LIST, got {}", args.at(0)?.type_name())));
    };
    let index = match args.get(1) {
        Some(index) => index.expect_i64("pop index")?,
        None => -1,
    };
    let mut items = items.write();
    let len = items.len();
    let at = resolve_index(index, len).ok_or_else(|| {
                                           RuntimeError::range(if len == 0 {
                                                                   "pop from an empty list".to_string()
                                                               } else {
                                                                   format!("index {index} out of range for list of length {len}")
                                                               })
                                       })?;
    Ok(items.remove(at))
}

/// Inserts into a collection in place.
///
/// - `insert(list, index, x)` shifts later elements right; `index` may be
///   the list length.
/// - `insert(map, key, x)` sets `key`.
/// - `insert(set, x)` adds `x` and returns whether it was new.
///
/// # Errors
/// Returns a `RangeError` for list positions out of bounds, an `ArityError`
/// for the wrong argument count for the collection, and a `TypeError` for
/// unhashable keys and other targets.
pub fn insert(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match (args.at(0)?, args.len()) {
        (Value::List(items), 3) => {
            let index = args.at(1)?.expect_i64("insert index")?;
            let mut items = items.write();
            let len = items.len();
            let at = if index == usize_to_i64(len) || index == 0 {
                usize::try_from(index).unwrap_or(len)
            } else {
                resolve_index(index, len).ok_or_else(|| {
                                             RuntimeError::range(format!("index {index} out of range for list of length {len}"))
                                         })?
            };
            items.insert(at, args.at(2)?.clone());
            Ok(NULL)
        },
        (Value::Map(map), 3) => {
            let key = args.at(1)?.clone();
            let hash = key.hash_key()?;
            map.write().insert_hashed(hash, key, args.at(2)?.clone());
            Ok(NULL)
        },
        (Value::Set(set), 2) => {
            let value = args.at(1)?.clone();
            let hash = value.hash_key()?;
            Ok(Value::Boolean(set.write().insert_hashed(hash, value)))
        },
        (Value::List(_) | Value::Map(_), _) => Err(RuntimeError::arity("insert() takes 3 arguments for a LIST or MAP")),
        (Value::Set(_), _) => Err(RuntimeError::arity("insert() takes 2 arguments for a SET")),
        (other, _) => Err(RuntimeError::type_error(format!("cannot insert into {}", other.type_name()))),
    }
}

/// Removes from a collection in place.
///
/// `remove(list, index)` returns the removed element, `remove(map, key)`
/// the removed value or `null`, `remove(set, x)` whether `x` was present.
pub fn remove(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let key = args.at(1)?;
    match args.at(0)? {
        Value::List(items) => {
            let index = key.expect_i64("remove index")?;
            let mut items = items.write();
            let len = items.len();
            let at = resolve_index(index, len).ok_or_else(|| {
                                                  RuntimeError::range(format!("index {index} out of range for list of length {len}"))
                                              })?;
            Ok(items.remove(at))
        },
        Value::Map(map) => {
            let hash = key.hash_key()?;
            Ok(map.write().remove_hashed(hash).unwrap_or(NULL))
        },
        Value::Set(set) => {
            let hash = key.hash_key()?;
            Ok(Value::Boolean(set.write().remove_hashed(hash)))
        },
        other => Err(RuntimeError::type_error(format!("cannot remove from {}", other.type_name()))),
    }
}

/// `contains(container, x)`: the same test as `x in container`.
pub fn contains(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::Boolean(sequence::contains(args.at(0)?, args.at(1)?)?))
}

/// Orders two values for `sort`, `min` and `max`.
///
/// Numbers compare across kinds, strings and byte strings lexicographically,
/// booleans with `false` first and lists element by element.
///
/// # Errors
/// Returns a `TypeError` for values of unrelated types.
pub fn order(left: &Value, right: &Value) -> EvalResult<Ordering> {
    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return Ok(compare(a, b)?.unwrap_or(Ordering::Equal));
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Ok(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.read().clone(), b.read().clone());
            for (x, y) in a.iter().zip(&b) {
                let ordering = order(x, y)?;
                if ordering.is_ne() {
                    return Ok(ordering);
                }
            }
            Ok(a.len().cmp(&b.len()))
        },
        _ => Err(RuntimeError::type_error(format!("cannot compare {} and {}",
                                                  left.type_name(),
                                                  right.type_name()))),
    }
}

/// Sorts `pairs` by their first element, stopping at the first failed
/// comparison.
fn sort_keyed(pairs: &mut [(Value, Value)]) -> EvalResult<()> {
    let mut failure = None;
    pairs.sort_by(|a, b| {
             order(&a.0, &b.0).unwrap_or_else(|e| {
                                  failure.get_or_insert(e);
                                  Ordering::Equal
                              })
         });
    failure.map_or(Ok(()), Err)
}

/// Returns a new sorted list of the elements of `xs`.
///
/// The sort is stable. The named argument `key` maps each element to the
/// value it is ordered by; `reverse = true` sorts in descending order.
///
/// # Errors
/// Returns a `TypeError` when two keys cannot be compared, and whatever the
/// key function raises.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let v = evaluator.run(r#"sort(["ccc", "a", "bb"], key = len, reverse = true)"#, "main").unwrap();
/// assert_eq!(v.to_string(), "[ccc, bb, a]");
/// ```
pub fn sort(evaluator: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    if let Some((name, _)) = args.named.iter().find(|(n, _)| n != "key" && n != "reverse") {
        return Err(RuntimeError::type_error(format!("sort() got an unexpected named argument '{name}'")));
    }
    let items = elements(args.at(0)?)?;
    let key = args.named("key").filter(|k| !matches!(k, Value::Null)).cloned();
    let reverse = args.named("reverse").is_some_and(Value::is_truthy);

    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        let sort_key = match &key {
            Some(key) => evaluator.call_value(key, Arguments::new(vec![item.clone()], args.position.clone()))?,
            None => item.clone(),
        };
        pairs.push((sort_key, item));
    }

    sort_keyed(&mut pairs)?;
    if reverse {
        pairs.reverse();
    }
    Ok(Value::from(pairs.into_iter().map(|(_, item)| item).collect::<Vec<_>>()))
}

/// `reverse(x)`: a reversed copy of a list, string or byte string.
pub fn reverse(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    match args.at(0)? {
        Value::List(items) => Ok(Value::from(items.read().iter().rev().cloned().collect::<Vec<_>>())),
        Value::String(s) => Ok(Value::from(s.chars().rev().collect::<String>())),
        Value::Bytes(b) => Ok(Value::Bytes(b.iter().rev().copied().collect::<Arc<[u8]>>())),
        other => Err(RuntimeError::type_error(format!("cannot reverse {}", other.type_name()))),
    }
}

/// Lists integers from `start` (default 0) up to, but not including,
/// `end`, advancing by `step`.
///
/// # Errors
/// Returns a `RangeError` for a zero step or a list longer than
/// [`MAX_RANGE_LEN`].
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run("range(3)", "main").unwrap().to_string(), "[0, 1, 2]");
/// assert_eq!(evaluator.run("range(10, 0, -4)", "main").unwrap().to_string(), "[10, 6, 2]");
/// ```
pub fn range(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let (start, end) = match args.len() {
        1 => (0, args.at(0)?.expect_i64("range end")?),
        _ => (args.at(0)?.expect_i64("range start")?, args.at(1)?.expect_i64("range end")?),
    };
    let step = match args.get(2) {
        Some(step) => step.expect_i64("range step")?,
        None => 1,
    };
    if step == 0 {
        return Err(RuntimeError::range("range() step must not be zero"));
    }

    let (start, end, step) = (i128::from(start), i128::from(end), i128::from(step));
    let count = if (step > 0 && end > start) || (step < 0 && end < start) {
        ((end - start).abs() + step.abs() - 1) / step.abs()
    } else {
        0
    };
    if count > MAX_RANGE_LEN as i128 {
        return Err(RuntimeError::range(format!("range of {count} elements is too long")));
    }

    Ok(Value::from((0..count).filter_map(|i| i64::try_from(start + i * step).ok())
                             .map(Value::Integer)
                             .collect::<Vec<_>>()))
}

/// `min(values...)` or `min(list)`.
pub fn min(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    extreme("min", args, Ordering::Less)
}

/// `max(values...)` or `max(list)`.
pub fn max(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    extreme("max", args, Ordering::Greater)
}

fn extreme(name: &str, args: Arguments, wanted: Ordering) -> EvalResult<Value> {
    let candidates = match args.positional.as_slice() {
        [single @ (Value::List(_) | Value::Set(_))] => elements(single)?,
        _ => args.positional,
    };
    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = Some(match best {
                        Some(current) if order(&candidate, &current)? != wanted => current,
                        _ => candidate,
                    });
    }
    best.ok_or_else(|| RuntimeError::range(format!("{name}() of an empty collection")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_across_kinds() {
        assert_eq!(order(&Value::Integer(2), &Value::Float(2.5)).unwrap(), Ordering::Less);
        assert_eq!(order(&Value::from("b"), &Value::from("a")).unwrap(), Ordering::Greater);
        assert!(order(&Value::from("a"), &Value::Integer(1)).is_err());
    }

    #[test]
    fn failed_comparisons_abort_the_sort() {
        let mut pairs = vec![(Value::Integer(1), NULL), (Value::from("x"), NULL)];
        assert!(sort_keyed(&mut pairs).is_err());
    }

    #[test]
    fn extremes() {
        let mut evaluator = Evaluator::default();
        assert_eq!(evaluator.run("max(3, 9, 4)", "test").unwrap().as_i64(), Some(9));
        assert_eq!(evaluator.run("min([3, 9, 4])", "test").unwrap().as_i64(), Some(3));
        assert!(evaluator.run("min([])", "test").is_err());
    }
}
