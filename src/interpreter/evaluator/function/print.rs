use std::io::{self, Write};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{
            core::{NULL, Value},
            function::Arguments,
        },
    },
};

/// Prints the arguments to standard output, separated by spaces, without a
/// trailing newline.
///
/// Values are formatted with their `Display` implementation, so strings are
/// written without quotes. The named argument `sep` replaces the separator.
///
/// # Returns
/// `null`.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let v = evaluator.run(r#"print("a", 1, sep = "-")"#, "main").unwrap();
/// assert!(matches!(v, blue::interpreter::value::core::Value::Null));
/// ```
pub fn print(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    write_out(&args, "")
}

/// Like [`print`], followed by a newline.
pub fn println(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    write_out(&args, "\n")
}

fn write_out(args: &Arguments, end: &str) -> EvalResult<Value> {
    let text = render(args)?;
    let mut out = io::stdout().lock();
    write!(out, "{text}{end}").and_then(|()| out.flush())
                              .map_err(|e| RuntimeError::host(format!("cannot write to stdout: {e}")))?;
    Ok(NULL)
}

fn render(args: &Arguments) -> EvalResult<String> {
    let sep = match args.named("sep") {
        Some(sep) => sep.expect_str("sep")?,
        None => " ",
    };
    if let Some((name, _)) = args.named.iter().find(|(n, _)| n != "sep") {
        return Err(RuntimeError::type_error(format!("print() got an unexpected named argument '{name}'")));
    }
    Ok(args.positional
           .iter()
           .map(ToString::to_string)
           .collect::<Vec<_>>()
           .join(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::token::Position;

    #[test]
    fn separator_defaults_to_a_space() {
        let args = Arguments::new(vec![Value::from("a"), Value::Integer(1)], Position::default());
        assert_eq!(render(&args).unwrap(), "a 1");
    }

    #[test]
    fn named_separator() {
        let mut args = Arguments::new(vec![Value::from("a"), Value::from("b")], Position::default());
        args.named.push(("sep".to_string(), Value::from(", ")));
        assert_eq!(render(&args).unwrap(), "a, b");

        args.named.push(("end".to_string(), Value::from("")));
        assert!(render(&args).is_err());
    }
}
