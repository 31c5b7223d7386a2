use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        process::Process,
        value::{
            core::{NULL, Value},
            function::{Arguments, Arity, Builtin, BuiltinObj},
        },
    },
    util::num::millis,
};

/// Runs `f(args...)` as a new process and returns its handle.
///
/// The body runs on a worker from the host scheduler with its own evaluator,
/// forked from the caller: it sees a private copy of every binding, while
/// lists, maps and sets are still shared by reference. When the body
/// returns, the process leaves the process table and its mailbox closes. A
/// failing body is logged; it does not affect the spawner.
///
/// # Errors
/// Returns a `TypeError` if `f` is not callable and a `ProcessError` if the
/// scheduler cannot start a worker.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let source = r#"
///     fun double(parent) { send(parent, recv(self()) * 2) }
///     val p = spawn(double, self())
///     send(p, 21)
///     recv(self(), 5000)
/// "#;
/// assert_eq!(evaluator.run(source, "main").unwrap().as_i64(), Some(42));
/// ```
pub fn spawn(evaluator: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let Arguments { mut positional,
                    position,
                    .. } = args;
    let rest = positional.split_off(1);
    let callee = positional.swap_remove(0);
    if !matches!(callee, Value::Function(_) | Value::Builtin(_)) {
        return Err(RuntimeError::type_error(format!("spawn() expects a function, got {}", callee.type_name())));
    }

    let mut child = evaluator.fork();
    let process = Arc::clone(child.process());
    let key = process.key().clone();
    tracing::debug!(process = %key, parent = %evaluator.process().key(), "spawn");

    evaluator.host.scheduler.spawn(format!("blue-{key}"),
                                   Box::new(move || {
                                       if let Err(error) = child.call_value(&callee, Arguments::new(rest, position)) {
                                           tracing::warn!(process = %key, %error, "process failed");
                                       }
                                   }))?;
    Ok(Value::Process(process))
}

/// `self()`: the handle of the running process.
pub fn current(evaluator: &mut Evaluator, _: Arguments) -> EvalResult<Value> {
    Ok(Value::Process(Arc::clone(evaluator.process())))
}

fn target(value: &Value) -> EvalResult<&Arc<Process>> {
    match value {
        Value::Process(process) => Ok(process),
        other => Err(RuntimeError::type_error(format!("expected a PROCESS, got {}", other.type_name()))),
    }
}

fn receive(process: &Process, timeout: Option<&Value>) -> EvalResult<Value> {
    let timeout = match timeout {
        Some(Value::Null) | None => None,
        Some(ms) => Some(millis(ms.expect_i64("timeout")?)?),
    };
    process.recv(timeout)
}

/// `send(process, value)`: appends `value` to the process mailbox.
///
/// # Errors
/// Returns a `ProcessError` once the process has finished.
pub fn send(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    target(args.at(0)?)?.send(args.at(1)?.clone())?;
    Ok(NULL)
}

/// `recv(process, timeout_ms)`: takes the next message, blocking until one
/// arrives or the timeout expires.
///
/// # Errors
/// Returns a `ProcessError` on timeout and when the mailbox is closed and
/// empty.
pub fn recv(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    receive(target(args.at(0)?)?, args.get(1))
}

/// `node_name()`: the node this interpreter's processes run on.
pub fn node_name(evaluator: &mut Evaluator, _: Arguments) -> EvalResult<Value> {
    Ok(Value::from(evaluator.config().node_name.as_str()))
}

/// The `send` member of a process handle: `p.send(value)`.
pub(crate) fn bound_send(process: &Arc<Process>) -> Value {
    let process = Arc::clone(process);
    Value::Builtin(Arc::new(Builtin::new("send",
                                         Arity::Exact(1),
                                         "p.send(value) delivers a value to p",
                                         move |_, args| {
                                             process.send(args.at(0)?.clone())?;
                                             Ok(NULL)
                                         })))
}

/// The `recv` member of a process handle: `p.recv(timeout_ms)`.
pub(crate) fn bound_recv(process: &Arc<Process>) -> Value {
    let process = Arc::clone(process);
    Value::Builtin(Arc::new(Builtin::new("recv",
                                         Arity::Range(0, 1),
                                         "p.recv(timeout_ms) takes the next message of p",
                                         move |_, args| receive(&process, args.get(0)))))
}

/// Builds the `proc` namespace from already registered builtins.
pub(crate) fn namespace(members: IndexMap<String, Value>) -> Value {
    Value::BuiltinObj(Arc::new(BuiltinObj { name: "proc".to_string(),
                                            help: "proc: spawn, self, send and recv".to_string(),
                                            members }))
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, ErrorKind},
        interpreter::evaluator::core::Evaluator,
    };

    #[test]
    fn recv_times_out() {
        let mut evaluator = Evaluator::default();
        match evaluator.run("recv(self(), 10)", "test") {
            Err(Error::Runtime(e)) => assert_eq!(e.kind, ErrorKind::Process),
            other => panic!("expected a process error, got {other:?}"),
        }
    }

    #[test]
    fn handles_expose_send_and_recv() {
        let mut evaluator = Evaluator::default();
        let v = evaluator.run("val me = self(); me.send(7); me.recv(100)", "test").unwrap();
        assert_eq!(v.as_i64(), Some(7));
        let v = evaluator.run("proc.self().id == self().id", "test").unwrap();
        assert_eq!(v.to_string(), "true");
    }

    #[test]
    fn spawn_requires_a_callable() {
        assert!(Evaluator::default().run("spawn(1)", "test").is_err());
    }
}
