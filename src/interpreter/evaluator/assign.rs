use crate::{
    ast::{AssignOperator, Expression},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::{
            binary,
            core::{EvalResult, Evaluator, operand},
        },
        value::core::Value,
    },
    util::num::resolve_index,
};

impl Evaluator {
    /// Evaluates `target = value` and the compound forms `target op= value`.
    ///
    /// An identifier target is rebound where it is defined. An index target
    /// updates the list or map in place, so every holder of the container
    /// sees the change. The expression yields the stored value.
    ///
    /// # Errors
    /// - `NameError` if the identifier, or the binding holding the container,
    ///   is immutable, or if a compound operator targets an unknown name.
    /// - `TypeError` for strings, which are immutable, and other targets
    ///   that cannot be assigned into.
    /// - `RangeError` for a list position out of bounds.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run(r#"var m = {"b": 1, "a": 2}; m["c"] = 3; m"#, "main").unwrap();
    /// assert_eq!(v.to_string(), "{b: 1, a: 2, c: 3}");
    ///
    /// let v = evaluator.run("var xs = [1, 2]; xs[-1] *= 10; xs", "main").unwrap();
    /// assert_eq!(v.to_string(), "[1, 20]");
    /// ```
    pub(crate) fn eval_assign(&mut self,
                              target: &Expression,
                              operator: AssignOperator,
                              value: &Expression,
                              frame: FrameId)
                              -> EvalResult<Value> {
        match target {
            Expression::Identifier { name, .. } => {
                let value = operand!(self.eval_expression(value, frame)?);
                if self.env.is_immutable(frame, name) {
                    return Err(RuntimeError::name(format!("cannot assign to immutable binding '{name}'")));
                }
                let updated = match operator {
                    AssignOperator::Assign => value,
                    AssignOperator::Compound(op) => {
                        let current = self.env
                                          .get(frame, name)
                                          .ok_or_else(|| RuntimeError::name(format!("identifier not found: {name}")))?;
                        binary::core::apply(op, &current, &value)?
                    },
                };
                self.env.set(frame, name, updated.clone())?;
                Ok(updated)
            },
            Expression::Index { left, index, .. } => {
                if let Some(name) = root_name(left)
                   && self.env.is_immutable(frame, name)
                {
                    return Err(RuntimeError::name(format!("cannot modify immutable binding '{name}'")));
                }
                let container = operand!(self.eval_expression(left, frame)?);
                let key = operand!(self.eval_expression(index, frame)?);
                let value = operand!(self.eval_expression(value, frame)?);

                let updated = match operator {
                    AssignOperator::Assign => value,
                    AssignOperator::Compound(op) => {
                        binary::core::apply(op, &self.index_value(&container, &key)?, &value)?
                    },
                };
                store(&container, key, updated.clone())?;
                Ok(updated)
            },
            other => Err(RuntimeError::type_error(format!("cannot assign to {other}"))),
        }
    }
}

/// The identifier an index chain such as `a[0]["k"]` starts from.
fn root_name(expression: &Expression) -> Option<&str> {
    match expression {
        Expression::Identifier { name, .. } => Some(name),
        Expression::Index { left, .. } => root_name(left),
        _ => None,
    }
}

fn store(container: &Value, key: Value, value: Value) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.write();
            let index = key.expect_i64("list index")?;
            let len = items.len();
            let at = resolve_index(index, len).ok_or_else(|| {
                                                  RuntimeError::range(format!("index {index} out of range for list of length {len}"))
                                              })?;
            items[at] = value;
            Ok(())
        },
        Value::Map(map) => {
            let hash = key.hash_key()?;
            map.write().insert_hashed(hash, key, value);
            Ok(())
        },
        Value::String(_) => Err(RuntimeError::type_error("strings are immutable")),
        other => Err(RuntimeError::type_error(format!("cannot assign into {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, ErrorKind},
        interpreter::evaluator::core::Evaluator,
    };

    fn kind_of(source: &str) -> ErrorKind {
        match Evaluator::default().run(source, "test") {
            Err(Error::Runtime(e)) => e.kind,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn containers_of_immutable_bindings_are_frozen() {
        assert_eq!(kind_of("val m = {}; m[\"a\"] = 1"), ErrorKind::Name);
        assert_eq!(kind_of("val xs = [[1]]; xs[0][0] = 2"), ErrorKind::Name);
    }

    #[test]
    fn strings_cannot_be_assigned_into() {
        assert_eq!(kind_of("var s = \"abc\"; s[0] = \"x\""), ErrorKind::Type);
    }

    #[test]
    fn mutation_is_visible_through_every_alias() {
        let v = Evaluator::default().run("var a = [1]; var b = a; b[0] = 5; a[0]", "test")
                                    .unwrap();
        assert_eq!(v.as_i64(), Some(5));
    }
}
