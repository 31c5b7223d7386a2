use crate::{
    ast::{Expression, InfixOperator},
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand},
        value::core::Value,
    },
};

impl Evaluator {
    /// Evaluates `and` / `or` with short-circuiting.
    ///
    /// The right operand is only evaluated when the left one does not decide
    /// the result. The result is the deciding operand itself, not a
    /// boolean, so `null or x` yields `x`.
    ///
    /// # Parameters
    /// - `left`: Left operand expression.
    /// - `op`: `And` or `Or`.
    /// - `right`: Right operand expression.
    /// - `frame`: Frame both operands are evaluated in.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run("null or 5", "main").unwrap();
    /// assert_eq!(v.as_i64(), Some(5));
    ///
    /// let v = evaluator.run("false and undefined_name", "main").unwrap();
    /// assert!(!v.is_truthy());
    /// ```
    pub(crate) fn eval_logic(&mut self,
                             left: &Expression,
                             op: InfixOperator,
                             right: &Expression,
                             frame: FrameId)
                             -> EvalResult<Value> {
        let left = operand!(self.eval_expression(left, frame)?);
        let decided = match op {
            InfixOperator::And => !left.is_truthy(),
            _ => left.is_truthy(),
        };
        if decided {
            return Ok(left);
        }
        self.eval_expression(right, frame)
    }
}
