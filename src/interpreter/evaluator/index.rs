use std::sync::Arc;

use crate::{
    ast::{Expression, InfixOperator},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::{
            core::{EvalResult, Evaluator, operand},
            function::process::{bound_recv, bound_send},
        },
        value::core::{NULL, Value},
    },
    util::num::{clamp_bound, resolve_index},
};

impl Evaluator {
    /// Evaluates `left[index]`, including member access `left.name`.
    ///
    /// When `left` is a list, string or byte string and the index is written
    /// as a range (`xs[1..3]`, `xs[1..<3]`), the result is a slice rather
    /// than a single element.
    pub(crate) fn eval_index(&mut self, left: &Expression, index: &Expression, frame: FrameId) -> EvalResult<Value> {
        let target = operand!(self.eval_expression(left, frame)?);

        if let Expression::Infix { left: start,
                                   operator: op @ (InfixOperator::Range | InfixOperator::RangeExclusive),
                                   right: end,
                                   .. } = index
           && matches!(target, Value::List(_) | Value::String(_) | Value::Bytes(_))
        {
            let start = operand!(self.eval_expression(start, frame)?);
            let end = operand!(self.eval_expression(end, frame)?);
            return slice(&target, &start, &end, *op == InfixOperator::Range);
        }

        let key = operand!(self.eval_expression(index, frame)?);
        self.index_value(&target, &key)
    }

    /// Looks `key` up in `target`.
    ///
    /// - Lists, strings and byte strings take an integer; `-1` is the last
    ///   element.
    /// - Maps return `null` for a missing key.
    /// - Sets return the element at that position in insertion order.
    /// - Modules, namespaces, processes, subscribers and errors take a member
    ///   name.
    ///
    /// # Errors
    /// Returns a `RangeError` for an out-of-bounds position, a `NameError`
    /// for an unknown member and a `TypeError` for anything not indexable.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::{evaluator::core::Evaluator, value::core::Value};
    ///
    /// let mut evaluator = Evaluator::default();
    /// assert_eq!(evaluator.run("[1, 2, 3][-1]", "main").unwrap().as_i64(), Some(3));
    /// assert_eq!(evaluator.run(r#""héllo"[1]"#, "main").unwrap().as_str(), Some("é"));
    /// let missing = evaluator.run("var m = {a: 1}; m.b", "main").unwrap();
    /// assert!(matches!(missing, Value::Null));
    /// ```
    pub fn index_value(&self, target: &Value, key: &Value) -> EvalResult<Value> {
        match target {
            Value::List(items) => {
                let items = items.read();
                let at = position(key, items.len(), "list")?;
                Ok(items[at].clone())
            },
            Value::String(s) => {
                let count = s.chars().count();
                let at = position(key, count, "string")?;
                Ok(s.chars().nth(at).map_or(NULL, |c| Value::from(c.to_string())))
            },
            Value::Bytes(bytes) => {
                let at = position(key, bytes.len(), "bytes")?;
                Ok(Value::Integer(i64::from(bytes[at])))
            },
            Value::Map(map) => Ok(map.read().get(key)?.unwrap_or(NULL)),
            Value::Set(set) => {
                let set = set.read();
                let at = position(key, set.len(), "set")?;
                Ok(set.get_index(at).unwrap_or(NULL))
            },
            Value::Module(module) => {
                let name = key.expect_str("module member")?;
                if !self.env.owns(module.arena) {
                    return Err(RuntimeError::process(format!("module '{}' belongs to another process", module.name)));
                }
                if !self.env.contains_local(module.env, name) {
                    return Err(RuntimeError::name(format!("module '{}' has no member '{name}'", module.name)));
                }
                Ok(self.env.get(module.env, name).unwrap_or(NULL))
            },
            Value::BuiltinObj(obj) => {
                let name = key.expect_str("member name")?;
                obj.members
                   .get(name)
                   .cloned()
                   .ok_or_else(|| RuntimeError::name(format!("'{}' has no member '{name}'", obj.name)))
            },
            Value::Process(process) => {
                match key.expect_str("process member")? {
                    "id" => Ok(i64::try_from(process.id()).map_or(Value::UInteger(process.id()), Value::Integer)),
                    "name" => Ok(Value::from(process.node())),
                    "send" => Ok(bound_send(process)),
                    "recv" => Ok(bound_recv(process)),
                    other => Err(RuntimeError::name(format!("process has no member '{other}'"))),
                }
            },
            Value::Subscriber(subscriber) => {
                match key.expect_str("subscriber member")? {
                    "id" => Ok(i64::try_from(subscriber.id()).map_or(Value::UInteger(subscriber.id()), Value::Integer)),
                    "topics" => Ok(Value::from(subscriber.topics()
                                                         .into_iter()
                                                         .map(Value::from)
                                                         .collect::<Vec<_>>())),
                    other => Err(RuntimeError::name(format!("subscriber has no member '{other}'"))),
                }
            },
            Value::Error(error) => {
                match key.expect_str("error member")? {
                    "message" => Ok(Value::from(error.message.as_str())),
                    "kind" => Ok(Value::from(error.kind.prefix())),
                    "trace" => Ok(Value::from(error.trace
                                                   .iter()
                                                   .map(|p| Value::from(p.to_string()))
                                                   .collect::<Vec<_>>())),
                    other => Err(RuntimeError::name(format!("error has no member '{other}'"))),
                }
            },
            other => Err(RuntimeError::type_error(format!("{} is not indexable", other.type_name()))),
        }
    }
}

/// Resolves an element position for a container of length `len`.
fn position(key: &Value, len: usize, what: &str) -> EvalResult<usize> {
    let index = key.expect_i64(&format!("{what} index"))?;
    resolve_index(index, len).ok_or_else(|| {
                                 RuntimeError::range(format!("index {index} out of range for {what} of length {len}"))
                             })
}

/// Cuts `target[start..end]` (or `..<`). Bounds may be negative and are
/// clamped to the length; an empty or inverted range gives an empty slice.
fn slice(target: &Value, start: &Value, end: &Value, inclusive: bool) -> EvalResult<Value> {
    let start = start.expect_i64("slice start")?;
    let end = end.expect_i64("slice end")?;
    let bounds = |len: usize| {
        let from = clamp_bound(start, len);
        let to = if inclusive {
            clamp_bound(end, len).saturating_add(usize::from(resolve_index(end, len).is_some())).min(len)
        } else {
            clamp_bound(end, len)
        };
        (from, to.max(from))
    };

    Ok(match target {
           Value::List(items) => {
               let items = items.read();
               let (from, to) = bounds(items.len());
               Value::from(items[from..to].to_vec())
           },
           Value::String(s) => {
               let chars = s.chars().collect::<Vec<_>>();
               let (from, to) = bounds(chars.len());
               Value::from(chars[from..to].iter().collect::<String>())
           },
           Value::Bytes(bytes) => {
               let (from, to) = bounds(bytes.len());
               Value::Bytes(Arc::from(&bytes[from..to]))
           },
           other => return Err(RuntimeError::type_error(format!("{} cannot be sliced", other.type_name()))),
       })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> Value {
        Value::from(values.iter().copied().map(Value::Integer).collect::<Vec<_>>())
    }

    #[test]
    fn inclusive_slices_include_the_end() {
        let v = slice(&list(&[0, 1, 2, 3]), &Value::Integer(1), &Value::Integer(2), true).unwrap();
        assert_eq!(v.to_string(), "[1, 2]");
        let v = slice(&list(&[0, 1, 2, 3]), &Value::Integer(1), &Value::Integer(-1), true).unwrap();
        assert_eq!(v.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn out_of_range_slices_are_clamped() {
        let v = slice(&list(&[0, 1]), &Value::Integer(1), &Value::Integer(10), false).unwrap();
        assert_eq!(v.to_string(), "[1]");
        let v = slice(&list(&[0, 1]), &Value::Integer(2), &Value::Integer(0), false).unwrap();
        assert_eq!(v.to_string(), "[]");
    }

    #[test]
    fn index_past_the_end_is_a_range_error() {
        let evaluator = Evaluator::default();
        let error = evaluator.index_value(&list(&[1]), &Value::Integer(1)).unwrap_err();
        assert_eq!(error.kind, crate::error::ErrorKind::Range);
    }
}
