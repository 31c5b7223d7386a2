use crate::{
    ast::{Expression, InfixOperator},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::{
            binary::{arithmetic, bitwise, comparison, sequence, set},
            core::{EvalResult, Evaluator, operand},
        },
        value::{core::Value, numeric::Number},
    },
};

impl Evaluator {
    /// Evaluates an infix expression. `and` and `or` short-circuit; every
    /// other operator evaluates left then right and calls [`apply`].
    pub(crate) fn eval_infix(&mut self,
                             left: &Expression,
                             op: InfixOperator,
                             right: &Expression,
                             frame: FrameId)
                             -> EvalResult<Value> {
        if matches!(op, InfixOperator::And | InfixOperator::Or) {
            return self.eval_logic(left, op, right, frame);
        }

        let left = operand!(self.eval_expression(left, frame)?);
        let right = operand!(self.eval_expression(right, frame)?);
        apply(op, &left, &right)
    }
}

/// Evaluates a binary operation between two values.
///
/// This function routes the operation to specialized handlers depending on
/// the operator and operand types. Equality, membership and ranges are
/// decided first; two numbers go through the numeric tower; sets, byte
/// strings and the sequence types have their own rules. Anything left over
/// is an "unknown operator" type error.
///
/// # Parameters
/// - `op`: The operator.
/// - `left`: Left operand.
/// - `right`: Right operand.
///
/// # Returns
/// An `EvalResult<Value>` containing the evaluated result.
///
/// # Example
/// ```
/// use blue::{
///     ast::InfixOperator,
///     interpreter::{evaluator::binary::core::apply, value::core::Value},
/// };
///
/// let sum = apply(InfixOperator::Add, &Value::Integer(3), &Value::Integer(4)).unwrap();
/// assert_eq!(sum.as_i64(), Some(7));
///
/// let text = apply(InfixOperator::Add, &Value::from("ab"), &Value::from("c")).unwrap();
/// assert_eq!(text.as_str(), Some("abc"));
///
/// let err = apply(InfixOperator::Sub, &Value::from("a"), &Value::Integer(1)).unwrap_err();
/// assert_eq!(err.message, "unknown operator: STRING - INTEGER");
/// ```
pub fn apply(op: InfixOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        InfixOperator::Eq => return Ok(Value::Boolean(left.equals(right))),
        InfixOperator::NotEq => return Ok(Value::Boolean(!left.equals(right))),
        InfixOperator::In => return sequence::contains(right, left).map(Value::Boolean),
        InfixOperator::NotIn => return sequence::contains(right, left).map(|found| Value::Boolean(!found)),
        InfixOperator::Range => return sequence::range(left, right, true),
        InfixOperator::RangeExclusive => return sequence::range(left, right, false),
        InfixOperator::And => {
            return Ok(if left.is_truthy() { right.clone() } else { left.clone() });
        },
        InfixOperator::Or => {
            return Ok(if left.is_truthy() { left.clone() } else { right.clone() });
        },
        _ => {},
    }

    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return arithmetic::eval_numbers(op, a, b)?.ok_or_else(|| unknown(left, op, right));
    }

    let result = match (left, right) {
        (Value::Set(_), _) => set::eval_set(op, left, right)?,
        (Value::Bytes(a), Value::Bytes(b)) => bitwise::eval_bytes(op, a, b)?,
        (Value::String(a), Value::String(b)) if comparison::is_ordering(op) => {
            Some(comparison::compare_strings(op, a, b))
        },
        (Value::String(_) | Value::List(_) | Value::Map(_), _) | (_, Value::String(_) | Value::List(_)) => {
            sequence::eval_sequence(op, left, right)?
        },
        _ => None,
    };
    result.ok_or_else(|| unknown(left, op, right))
}

/// The "unknown operator: T1 OP T2" error for a pair of operands.
pub(crate) fn unknown(left: &Value, op: InfixOperator, right: &Value) -> RuntimeError {
    RuntimeError::unknown_operator(left.type_name(), op, right.type_name())
}
