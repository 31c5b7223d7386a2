use crate::{
    ast::{Expression, PrefixOperator},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand},
        value::{
            core::Value,
            numeric::{Number, bit_not, negate},
        },
    },
};

impl Evaluator {
    pub(crate) fn eval_prefix(&mut self,
                              op: PrefixOperator,
                              right: &Expression,
                              frame: FrameId)
                              -> EvalResult<Value> {
        let value = operand!(self.eval_expression(right, frame)?);
        Self::eval_unary(op, &value)
    }

    /// Evaluates a unary operation on a value.
    ///
    /// Supported operators:
    /// - `Neg`: numeric negation. Negating `i64::MIN` promotes to a big
    ///   integer; negating an unsigned integer yields a signed one.
    /// - `Bang` / `Not`: boolean negation of the value's truthiness.
    /// - `BitNot`: bitwise complement of an integer.
    ///
    /// # Parameters
    /// - `op`: Unary operator.
    /// - `value`: Input value.
    ///
    /// # Returns
    /// The computed `Value`, or a `TypeError` for an operand the operator
    /// does not apply to.
    ///
    /// # Example
    /// ```
    /// use blue::{
    ///     ast::PrefixOperator,
    ///     interpreter::{evaluator::core::Evaluator, value::core::Value},
    /// };
    ///
    /// let v = Evaluator::eval_unary(PrefixOperator::Neg, &Value::Integer(5)).unwrap();
    /// assert_eq!(v.as_i64(), Some(-5));
    ///
    /// let v = Evaluator::eval_unary(PrefixOperator::Not, &Value::Null).unwrap();
    /// assert!(v.is_truthy());
    ///
    /// let v = Evaluator::eval_unary(PrefixOperator::BitNot, &Value::Integer(0)).unwrap();
    /// assert_eq!(v.as_i64(), Some(-1));
    /// ```
    pub fn eval_unary(op: PrefixOperator, value: &Value) -> EvalResult<Value> {
        let unsupported = || RuntimeError::type_error(format!("unknown operator: {op}{}", value.type_name()));

        match op {
            PrefixOperator::Bang | PrefixOperator::Not => Ok(Value::Boolean(!value.is_truthy())),
            PrefixOperator::Neg => Number::from_value(value).map(negate).ok_or_else(unsupported),
            PrefixOperator::BitNot => Number::from_value(value).and_then(bit_not)
                                                               .ok_or_else(unsupported),
        }
    }
}
