use crate::{
    ast::{BlockStatement, CatchClause, Expression, MatchArm},
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand},
        value::core::{NULL, Value},
    },
};

impl Evaluator {
    /// Evaluates an `if` expression.
    ///
    /// # Returns
    /// The value of the chosen block, or `null` when the condition is falsy
    /// and there is no `else`.
    pub(crate) fn eval_if(&mut self,
                          condition: &Expression,
                          consequence: &BlockStatement,
                          alternative: Option<&BlockStatement>,
                          frame: FrameId)
                          -> EvalResult<Value> {
        let condition = operand!(self.eval_expression(condition, frame)?);
        if condition.is_truthy() {
            self.eval_block(consequence, frame)
        } else if let Some(alternative) = alternative {
            self.eval_block(alternative, frame)
        } else {
            Ok(NULL)
        }
    }

    /// Evaluates a `match` expression.
    ///
    /// With a subject, an arm fires when one of its conditions equals the
    /// subject; without one, when a condition is truthy. `_` always fires.
    /// Conditions are evaluated in order and only until an arm fires.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run(r#"match 3 { 1, 2 => { "low" } 3 => { "three" } _ => { "high" } }"#, "main")
    ///                  .unwrap();
    /// assert_eq!(v.as_str(), Some("three"));
    /// ```
    pub(crate) fn eval_match(&mut self,
                             subject: Option<&Expression>,
                             arms: &[MatchArm],
                             frame: FrameId)
                             -> EvalResult<Value> {
        let subject = match subject {
            Some(subject) => Some(operand!(self.eval_expression(subject, frame)?)),
            None => None,
        };

        for arm in arms {
            for condition in &arm.conditions {
                let fires = if condition.is_wildcard() {
                    true
                } else {
                    let value = operand!(self.eval_expression(condition, frame)?);
                    subject.as_ref()
                           .map_or_else(|| value.is_truthy(), |subject| subject.equals(&value))
                };
                if fires {
                    return self.eval_block(&arm.consequence, frame);
                }
            }
        }
        Ok(NULL)
    }

    /// Evaluates `try { } catch (e) { } finally { }`.
    ///
    /// An error raised in the body is bound to the catch name as an `Error`
    /// value and the handler runs; without a handler the error keeps
    /// propagating. The `finally` block always runs afterwards; if it ends in
    /// `return`, `break` or `continue`, that marker wins.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run("try { 1 / 0 } catch (e) { e.message }", "main").unwrap();
    /// assert_eq!(v.as_str(), Some("division by zero"));
    /// ```
    pub(crate) fn eval_try(&mut self,
                           body: &BlockStatement,
                           catch: Option<&CatchClause>,
                           finally: Option<&BlockStatement>,
                           frame: FrameId)
                           -> EvalResult<Value> {
        let result = match (self.eval_block(body, frame), catch) {
            (Err(error), Some(handler)) => {
                tracing::trace!(error = %error, "caught");
                let scope = self.env.push(Some(frame));
                if let Some(name) = &handler.name {
                    self.env.define(scope, name, Value::from(error));
                }
                let handled = self.eval_block(&handler.body, scope);
                self.env.release(scope);
                handled
            },
            (result, _) => result,
        };

        if let Some(finally) = finally {
            let cleanup = self.eval_block(finally, frame)?;
            if cleanup.is_control() {
                return Ok(cleanup);
            }
        }
        result
    }
}
