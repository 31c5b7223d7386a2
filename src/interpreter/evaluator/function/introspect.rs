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

/// `type(x)`: the upper-case type name of `x`, e.g. `"INTEGER"`.
pub fn type_of(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::from(args.at(0)?.type_name()))
}

/// `hash(x)`: the hash key maps and sets file `x` under.
///
/// # Errors
/// Returns a `TypeError` for unhashable values.
pub fn hash(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Ok(Value::UInteger(args.at(0)?.hash_key()?))
}

/// Describes a value.
///
/// Without an argument, lists every name bound in the core frame. For a
/// builtin, returns its help text; for a namespace, its help text followed by
/// its members; for a function, its signature.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let text = evaluator.run("help(len)", "main").unwrap();
/// assert!(text.as_str().unwrap().starts_with("len(x)"));
///
/// let text = evaluator.run("fun area(w, h = 1) { w * h }; help(area)", "main").unwrap();
/// assert_eq!(text.as_str(), Some("fun area(w, h = 1)"));
/// ```
pub fn help(evaluator: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let Some(value) = args.get(0) else {
        let names = evaluator.env
                             .bindings(evaluator.core)
                             .into_iter()
                             .map(|(name, _)| name)
                             .collect::<Vec<_>>();
        return Ok(Value::from(format!("available: {}", names.join(", "))));
    };

    let text = match value {
        Value::Builtin(builtin) => builtin.help.clone(),
        Value::BuiltinObj(obj) => {
            let members = obj.members.keys().cloned().collect::<Vec<_>>();
            format!("{}\nmembers: {}", obj.help, members.join(", "))
        },
        Value::Function(function) => {
            let literal = &function.literal;
            let parameters = literal.parameters
                                    .iter()
                                    .map(|p| match &p.default {
                                        Some(default) => format!("{} = {default}", p.name),
                                        None => p.name.clone(),
                                    })
                                    .collect::<Vec<_>>();
            format!("fun {}({})", literal.name.as_deref().unwrap_or(""), parameters.join(", "))
        },
        Value::Module(module) => format!("module {}", module.name),
        other => format!("{} {}", other.type_name(), other.inspect()),
    };
    Ok(Value::from(text))
}

/// `error(message)`: raises a `HostError` carrying `message`.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let v = evaluator.run(r#"try { error("boom") } catch (e) { e.kind + ": " + e.message }"#, "main")
///                  .unwrap();
/// assert_eq!(v.as_str(), Some("HostError: boom"));
/// ```
pub fn error(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Err(RuntimeError::host(args.at(0)?.to_string()))
}

/// `assert(condition, message)`: raises a `HostError` unless `condition`
/// is truthy.
pub fn assert(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    if args.at(0)?.is_truthy() {
        return Ok(NULL);
    }
    Err(RuntimeError::host(match args.get(1) {
                               Some(message) => format!("assertion failed: {message}"),
                               None => "assertion failed".to_string(),
                           }))
}
