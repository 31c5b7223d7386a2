use crate::{
    ast::InfixOperator,
    interpreter::{
        evaluator::{binary::comparison, core::EvalResult},
        value::{
            core::Value,
            numeric::{Number, arithmetic, bitwise},
        },
    },
};

/// Applies `op` to two numbers.
///
/// Arithmetic promotes along the numeric tower, ordering operators compare
/// the promoted pair and bitwise operators require integral operands.
///
/// # Returns
/// `Ok(None)` if the operator has no meaning for numbers (or, for bitwise
/// operators, for non-integral numbers).
pub fn eval_numbers(op: InfixOperator, left: Number, right: Number) -> EvalResult<Option<Value>> {
    use InfixOperator::{
        Add, BitAnd, BitOr, BitXor, Div, FloorDiv, Gt, GtEq, Lt, LtEq, Mod, Mul, Pow, Shl, Shr, Sub,
    };

    match op {
        Add | Sub | Mul | Div | FloorDiv | Mod | Pow => arithmetic(op, left, right).map(Some),
        Lt | LtEq | Gt | GtEq => comparison::compare_numbers(op, left, right).map(Some),
        BitAnd | BitOr | BitXor | Shl | Shr => bitwise(op, left, right),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(op: InfixOperator, left: Value, right: Value) -> Value {
        eval_numbers(op,
                     Number::from_value(&left).unwrap(),
                     Number::from_value(&right).unwrap()).unwrap()
                                                         .unwrap()
    }

    #[test]
    fn mixed_float_and_integer_is_float() {
        let v = eval(InfixOperator::Add, Value::Integer(1), Value::Float(0.5));
        assert!(matches!(v, Value::Float(f) if (f - 1.5).abs() < f64::EPSILON));
    }

    #[test]
    fn truncating_integer_division() {
        assert_eq!(eval(InfixOperator::Div, Value::Integer(2), Value::Integer(3)).as_i64(), Some(0));
        assert_eq!(eval(InfixOperator::Div, Value::Integer(-7), Value::Integer(2)).as_i64(),
                   Some(-3));
        assert_eq!(eval(InfixOperator::FloorDiv, Value::Integer(-7), Value::Integer(2)).as_i64(),
                   Some(-4));
    }

    #[test]
    fn bitwise_on_floats_is_not_defined() {
        let result = eval_numbers(InfixOperator::BitAnd, Number::Float(1.0), Number::Int(1)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn comparison_across_kinds() {
        let v = eval(InfixOperator::Lt, Value::UInteger(3), Value::Float(3.5));
        assert!(matches!(v, Value::Boolean(true)));
    }
}
