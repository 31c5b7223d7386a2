use crate::{
    ast::InfixOperator,
    interpreter::{
        evaluator::core::EvalResult,
        value::{collection::SetValue, core::Value},
    },
};

/// Evaluates an operator whose left operand is a set.
///
/// With two sets the operators map to set algebra and subset relations:
/// - `|` and `+` produce the union.
/// - `&` produces the intersection.
/// - `^` produces the symmetric difference.
/// - `-` produces the difference.
/// - `<=` / `<` test for a subset / proper subset, `>=` / `>` for a superset
///   / proper superset.
///
/// With a set and any other value, `+` adds the value and `-` removes it.
/// Both operands are left untouched; the result is a new set.
///
/// # Parameters
/// - `op`: The operator.
/// - `left`: A `Value::Set`.
/// - `right`: Right operand.
///
/// # Returns
/// `Ok(None)` if the operator has no meaning for the operands.
///
/// # Example
/// ```
/// use blue::{
///     ast::InfixOperator,
///     interpreter::{
///         evaluator::binary::set::eval_set,
///         value::{collection::SetValue, core::Value},
///     },
/// };
///
/// let a = Value::from(SetValue::from_values([Value::Integer(1), Value::Integer(2)]).unwrap());
/// let b = Value::from(SetValue::from_values([Value::Integer(2), Value::Integer(3)]).unwrap());
///
/// let union = eval_set(InfixOperator::BitOr, &a, &b).unwrap().unwrap();
/// assert_eq!(union.to_string(), "{1, 2, 3}");
///
/// let subset = eval_set(InfixOperator::LtEq, &a, &b).unwrap().unwrap();
/// assert!(!subset.is_truthy());
/// ```
pub fn eval_set(op: InfixOperator, left: &Value, right: &Value) -> EvalResult<Option<Value>> {
    let Value::Set(left) = left else {
        return Ok(None);
    };
    let left = left.snapshot();

    let Value::Set(right) = right else {
        return with_scalar(op, left, right);
    };
    let right = right.snapshot();

    let subset = || left.is_subset(&right);
    let superset = || right.is_subset(&left);

    Ok(Some(match op {
                InfixOperator::BitOr | InfixOperator::Add => Value::from(left.union(&right)),
                InfixOperator::BitAnd => Value::from(left.intersection(&right)),
                InfixOperator::BitXor => Value::from(left.symmetric_difference(&right)),
                InfixOperator::Sub => Value::from(left.difference(&right)),
                InfixOperator::LtEq => Value::Boolean(subset()),
                InfixOperator::Lt => Value::Boolean(subset() && left.len() < right.len()),
                InfixOperator::GtEq => Value::Boolean(superset()),
                InfixOperator::Gt => Value::Boolean(superset() && left.len() > right.len()),
                _ => return Ok(None),
            }))
}

fn with_scalar(op: InfixOperator, mut set: SetValue, value: &Value) -> EvalResult<Option<Value>> {
    match op {
        InfixOperator::Add => {
            set.insert(value.clone())?;
        },
        InfixOperator::Sub => {
            set.remove(value)?;
        },
        _ => return Ok(None),
    }
    Ok(Some(Value::from(set)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::interpreter::value::function::{Arity, Builtin};

    fn set(values: &[i64]) -> Value {
        Value::from(SetValue::from_values(values.iter().copied().map(Value::Integer)).unwrap())
    }

    #[test]
    fn proper_subset_needs_a_smaller_set() {
        let lt = eval_set(InfixOperator::Lt, &set(&[1, 2]), &set(&[1, 2])).unwrap().unwrap();
        assert!(!lt.is_truthy());
        let lt = eval_set(InfixOperator::Lt, &set(&[1]), &set(&[1, 2])).unwrap().unwrap();
        assert!(lt.is_truthy());
    }

    #[test]
    fn adding_a_scalar_builds_a_new_set() {
        let original = set(&[1]);
        let grown = eval_set(InfixOperator::Add, &original, &Value::Integer(2)).unwrap().unwrap();
        assert_eq!(grown.to_string(), "{1, 2}");
        assert_eq!(original.to_string(), "{1}");
    }

    #[test]
    fn unhashable_scalars_are_rejected() {
        let builtin = Builtin::new("f", Arity::Exact(0), "", |_, _| Ok(Value::Null));
        let result = eval_set(InfixOperator::Add, &set(&[]), &Value::Builtin(Arc::new(builtin)));
        assert!(result.is_err());
    }
}
