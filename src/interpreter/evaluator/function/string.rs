use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator},
            function::convert::elements,
        },
        value::{core::Value, function::Arguments},
    },
};

/// Joins the display forms of the elements of a list or set.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run(r#"join([1, "a", 2.5], "-")"#, "main").unwrap().as_str(), Some("1-a-2.5"));
/// ```
pub fn join(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let separator = match args.get(1) {
        Some(sep) => sep.expect_str("separator")?,
        None => "",
    };
    let items = match args.at(0)? {
        value @ (Value::List(_) | Value::Set(_)) => elements(value)?,
        other => return Err(RuntimeError::type_error(format!("join() expects a LIST, got {}", other.type_name()))),
    };
    Ok(Value::from(items.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(separator)))
}

/// Splits a string on `separator`, or on runs of whitespace when no
/// separator is given.
///
/// # Errors
/// Returns a `RangeError` for an empty separator.
pub fn split(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let text = args.at(0)?.expect_str("split() argument")?;
    let parts: Vec<Value> = match args.get(1) {
        None => text.split_whitespace().map(Value::from).collect(),
        Some(sep) => {
            let sep = sep.expect_str("separator")?;
            if sep.is_empty() {
                return Err(RuntimeError::range("split() separator must not be empty"));
            }
            text.split(sep).map(Value::from).collect()
        },
    };
    Ok(Value::from(parts))
}

/// `upper(s)`
pub fn upper(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.expect_str("upper() argument")?.to_uppercase()))
}

/// `lower(s)`
pub fn lower(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.expect_str("lower() argument")?.to_lowercase()))
}

/// `trim(s)`
pub fn trim(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.expect_str("trim() argument")?.trim()))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluator::core::Evaluator;

    #[test]
    fn split_on_whitespace_and_separators() {
        let mut evaluator = Evaluator::default();
        let v = evaluator.run(r#"split("  a b\tc ")"#, "test").unwrap();
        assert_eq!(v.to_string(), "[a, b, c]");
        let v = evaluator.run(r#"len(split("a,,b", ","))"#, "test").unwrap();
        assert_eq!(v.as_i64(), Some(3));
        assert!(evaluator.run(r#"split("a", "")"#, "test").is_err());
    }
}
