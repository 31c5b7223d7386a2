use std::sync::Arc;

use ::regex::Regex;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{core::Value, function::Arguments},
    },
};

/// The compiled pattern behind a regex value, or a string compiled on the
/// spot.
fn pattern(value: &Value) -> EvalResult<Arc<Regex>> {
    match value {
        Value::Regex(regex) => Ok(Arc::clone(regex)),
        Value::String(source) => compile(source).map(Arc::new),
        other => Err(RuntimeError::type_error(format!("pattern must be a REGEX or STRING, got {}",
                                                      other.type_name()))),
    }
}

fn compile(source: &str) -> EvalResult<Regex> {
    Regex::new(source).map_err(|e| RuntimeError::type_error(format!("invalid regex {source:?}: {e}")))
}

/// `regex(pattern)`: compiles a pattern once for repeated use.
///
/// # Errors
/// Returns a `TypeError` for invalid patterns.
pub fn regex(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::Regex(pattern(args.at(0)?)?))
}

/// `matches(s, pattern)`: whether the pattern matches anywhere in `s`.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run(r#"matches("abc123", r/\d+/)"#, "main").unwrap().to_string(), "true");
/// assert_eq!(evaluator.run(r#"matches("abc", "^b")"#, "main").unwrap().to_string(), "false");
/// ```
pub fn matches(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let text = args.at(0)?.expect_str("matches() subject")?;
    Ok(Value::Boolean(pattern(args.at(1)?)?.is_match(text)))
}

/// `find_all(s, pattern)`: every non-overlapping match, in order.
pub fn find_all(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let text = args.at(0)?.expect_str("find_all() subject")?;
    let regex = pattern(args.at(1)?)?;
    Ok(Value::from(regex.find_iter(text)
                        .map(|m| Value::from(m.as_str()))
                        .collect::<Vec<_>>()))
}

/// `replace(s, pattern, replacement)`: replaces every match.
///
/// The replacement may refer to groups as `$1` or `${name}`.
pub fn replace(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let text = args.at(0)?.expect_str("replace() subject")?;
    let regex = pattern(args.at(1)?)?;
    let replacement = args.at(2)?.expect_str("replacement")?;
    Ok(Value::from(regex.replace_all(text, replacement).into_owned()))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluator::core::Evaluator;

    #[test]
    fn find_and_replace() {
        let mut evaluator = Evaluator::default();
        let v = evaluator.run(r#"find_all("a1b22c333", r/\d+/)"#, "test").unwrap();
        assert_eq!(v.to_string(), "[1, 22, 333]");
        let v = evaluator.run(r#"replace("2024-01-31", r/(\d+)-(\d+)-(\d+)/, "$3.$2.$1")"#, "test")
                         .unwrap();
        assert_eq!(v.as_str(), Some("31.01.2024"));
    }

    #[test]
    fn invalid_patterns_are_type_errors() {
        assert!(Evaluator::default().run(r#"regex("(")"#, "test").is_err());
    }
}
