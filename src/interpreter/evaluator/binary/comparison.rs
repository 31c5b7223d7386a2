use std::cmp::Ordering;

use crate::{
    ast::InfixOperator,
    interpreter::{
        evaluator::core::EvalResult,
        value::{
            core::Value,
            numeric::{Number, compare},
        },
    },
};

/// Returns `true` for `<`, `<=`, `>` and `>=`.
#[must_use]
pub const fn is_ordering(op: InfixOperator) -> bool {
    matches!(op,
             InfixOperator::Lt | InfixOperator::LtEq | InfixOperator::Gt | InfixOperator::GtEq)
}

/// Decides an ordering operator from the ordering of its operands.
///
/// An unordered pair (a NaN operand) satisfies no operator.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
///
/// use blue::{ast::InfixOperator, interpreter::evaluator::binary::comparison::holds};
///
/// assert!(holds(InfixOperator::LtEq, Some(Ordering::Equal)));
/// assert!(!holds(InfixOperator::Gt, None));
/// ```
#[must_use]
pub fn holds(op: InfixOperator, ordering: Option<Ordering>) -> bool {
    ordering.is_some_and(|ordering| match op {
                            InfixOperator::Lt => ordering.is_lt(),
                            InfixOperator::LtEq => ordering.is_le(),
                            InfixOperator::Gt => ordering.is_gt(),
                            InfixOperator::GtEq => ordering.is_ge(),
                            _ => false,
                        })
}

/// Compares two numbers after promotion.
pub fn compare_numbers(op: InfixOperator, left: Number, right: Number) -> EvalResult<Value> {
    Ok(Value::Boolean(holds(op, compare(left, right)?)))
}

/// Compares two strings lexicographically by code point.
#[must_use]
pub fn compare_strings(op: InfixOperator, left: &str, right: &str) -> Value {
    Value::Boolean(holds(op, Some(left.cmp(right))))
}
