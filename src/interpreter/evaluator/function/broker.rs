use std::sync::Arc;

use crate::{
    error::RuntimeError,
    interpreter::{
        broker::{Broker, Subscriber},
        evaluator::core::{EvalResult, Evaluator},
        value::{
            core::{NULL, Value},
            function::Arguments,
        },
    },
    util::num::{millis, usize_to_i64},
};

fn subscriber(value: &Value) -> EvalResult<&Arc<Subscriber>> {
    match value {
        Value::Subscriber(subscriber) => Ok(subscriber),
        other => Err(RuntimeError::type_error(format!("expected a SUBSCRIBER, got {}", other.type_name()))),
    }
}

/// `subscribe(topic)`: a new subscriber listening on `topic`.
pub fn subscribe(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let topic = args.at(0)?.expect_str("topic")?;
    Ok(Value::Subscriber(Broker::global().subscribe(topic)))
}

/// Delivers `{topic: topic, msg: value}` to every active subscriber of
/// `topic` and returns how many received it.
///
/// # Example
/// ```
/// use blue::interpreter::evaluator::core::Evaluator;
///
/// let mut evaluator = Evaluator::default();
/// let source = r#"
///     val s = subscribe("doc-news")
///     publish("doc-news", 1)
///     publish("doc-other", 2)
///     val m = poll(s, 1000)
///     unsubscribe(s)
///     m.msg
/// "#;
/// assert_eq!(evaluator.run(source, "main").unwrap().as_i64(), Some(1));
/// ```
pub fn publish(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let topic = args.at(0)?.expect_str("topic")?;
    let delivered = Broker::global().publish(topic, args.at(1)?)?;
    Ok(Value::Integer(usize_to_i64(delivered)))
}

/// `poll(subscriber, timeout_ms)`: the next `{topic, msg}` message.
///
/// # Errors
/// Returns a `ProcessError` on timeout and once the subscriber is closed
/// and drained.
pub fn poll(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let subscriber = subscriber(args.at(0)?)?;
    let timeout = match args.get(1) {
        Some(Value::Null) | None => None,
        Some(ms) => Some(millis(ms.expect_i64("timeout")?)?),
    };
    subscriber.poll(timeout)
}

/// `add_topic(subscriber, topic)`
pub fn add_topic(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    subscriber(args.at(0)?)?.add_topic(args.at(1)?.expect_str("topic")?);
    Ok(NULL)
}

/// `remove_topic(subscriber, topic)`: whether the subscriber was listening
/// on `topic`.
pub fn remove_topic(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let removed = subscriber(args.at(0)?)?.remove_topic(args.at(1)?.expect_str("topic")?);
    Ok(Value::Boolean(removed))
}

/// `unsubscribe(subscriber)`: closes the subscriber. Publishing skips it
/// from then on; messages already queued can still be polled.
pub fn unsubscribe(_: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    Broker::global().unsubscribe(subscriber(args.at(0)?)?);
    Ok(NULL)
}
