use std::sync::Arc;

use crate::{
    ast::InfixOperator,
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// Applies `&`, `|` or `^` element-wise to two byte strings of equal length;
/// `+` concatenates them.
///
/// # Returns
/// `Ok(None)` for any other operator.
///
/// # Errors
/// Returns a `TypeError` if a bitwise operator gets byte strings of
/// different lengths.
pub fn eval_bytes(op: InfixOperator, left: &[u8], right: &[u8]) -> EvalResult<Option<Value>> {
    let combine: fn(u8, u8) -> u8 = match op {
        InfixOperator::BitAnd => |a, b| a & b,
        InfixOperator::BitOr => |a, b| a | b,
        InfixOperator::BitXor => |a, b| a ^ b,
        InfixOperator::Add => {
            let joined = left.iter().chain(right).copied().collect::<Arc<[u8]>>();
            return Ok(Some(Value::Bytes(joined)));
        },
        _ => return Ok(None),
    };

    if left.len() != right.len() {
        return Err(RuntimeError::type_error(format!("bitwise {op} needs BYTES of equal length, got {} and {}",
                                                    left.len(),
                                                    right.len())));
    }

    Ok(Some(Value::Bytes(left.iter().zip(right).map(|(&a, &b)| combine(a, b)).collect())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_is_element_wise() {
        let v = eval_bytes(InfixOperator::BitXor, &[0xff, 0x0f], &[0x0f, 0x0f]).unwrap().unwrap();
        assert!(matches!(v, Value::Bytes(b) if &*b == [0xf0, 0x00]));
    }

    #[test]
    fn lengths_must_match() {
        assert!(eval_bytes(InfixOperator::BitAnd, &[1], &[1, 2]).is_err());
    }
}
