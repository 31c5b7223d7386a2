use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::{
    error::RuntimeError,
    interpreter::{
        environment::{Environment, FrameId},
        evaluator::{
            core::EvalResult,
            function::{broker, collection, convert, introspect, math, print, process, regex, string, time},
        },
        value::{
            core::Value,
            function::{Arity, Builtin},
        },
    },
};

/// Defines the builtin table.
///
/// Each entry provides:
/// - a string name,
/// - an arity specification,
/// - the help text shown by `help`,
/// - the function implementing the builtin,
/// - optionally, `Builtin` modifiers such as `mutating` or `with_named`.
///
/// The macro produces:
/// - `core_builtins()` (fresh `Builtin` values for the registry),
/// - `BUILTIN_FUNCTIONS` (public list of builtin names).
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                help: $help:literal,
                func: $func:expr
                $(, with: [$($modifier:ident),* $(,)?])? $(,)?
            }
        ),* $(,)?
    ) => {
        fn core_builtins() -> Vec<Builtin> {
            vec![
                $(
                    Builtin::new($name, $arity, $help, $func)$($(.$modifier())*)?,
                )*
            ]
        }

        /// Names of the builtins every evaluator starts with, in
        /// registration order.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    "print"        => { arity: Arity::AtLeast(0),  help: "print(values...) writes the values separated by spaces",
                        func: print::print, with: [with_named] },
    "println"      => { arity: Arity::AtLeast(0),  help: "println(values...) writes the values and a newline",
                        func: print::println, with: [with_named] },
    "len"          => { arity: Arity::Exact(1),    help: "len(x) is the number of elements or characters",
                        func: collection::len },
    "type"         => { arity: Arity::Exact(1),    help: "type(x) is the type name of x",
                        func: introspect::type_of },
    "str"          => { arity: Arity::Exact(1),    help: "str(x) converts x to a string",
                        func: convert::str },
    "inspect"      => { arity: Arity::Exact(1),    help: "inspect(x) is the printable form of x",
                        func: convert::inspect },
    "int"          => { arity: Arity::Range(1, 2), help: "int(x, base = 10) converts x to an integer",
                        func: convert::int },
    "float"        => { arity: Arity::Exact(1),    help: "float(x) converts x to a float",
                        func: convert::float },
    "uint"         => { arity: Arity::Exact(1),    help: "uint(x) converts x to an unsigned integer",
                        func: convert::uint },
    "bigint"       => { arity: Arity::Exact(1),    help: "bigint(x) converts x to an arbitrary-precision integer",
                        func: convert::bigint },
    "bigfloat"     => { arity: Arity::Exact(1),    help: "bigfloat(x) converts x to an arbitrary-precision decimal",
                        func: convert::bigfloat },
    "bytes"        => { arity: Arity::Exact(1),    help: "bytes(x) converts a string or a list of integers to bytes",
                        func: convert::bytes },
    "list"         => { arity: Arity::Exact(1),    help: "list(x) collects the elements of x into a new list",
                        func: convert::list },
    "set"          => { arity: Arity::Range(0, 1), help: "set(x) collects the elements of x into a new set",
                        func: convert::set },
    "keys"         => { arity: Arity::Exact(1),    help: "keys(m) lists the keys of a map",
                        func: collection::keys },
    "values"       => { arity: Arity::Exact(1),    help: "values(m) lists the values of a map",
                        func: collection::values },
    "push"         => { arity: Arity::AtLeast(2),  help: "push(list, values...) appends to a list",
                        func: collection::push, with: [mutating] },
    "pop"          => { arity: Arity::Range(1, 2), help: "pop(list, index = -1) removes and returns an element",
                        func: collection::pop, with: [mutating] },
    "insert"       => { arity: Arity::Range(2, 3), help: "insert(list, index, x), insert(map, key, x) or insert(set, x)",
                        func: collection::insert, with: [mutating] },
    "remove"       => { arity: Arity::Exact(2),    help: "remove(list, index), remove(map, key) or remove(set, x)",
                        func: collection::remove, with: [mutating] },
    "contains"     => { arity: Arity::Exact(2),    help: "contains(container, x) is the same as x in container",
                        func: collection::contains },
    "sort"         => { arity: Arity::Exact(1),    help: "sort(xs, key = null, reverse = false) returns a sorted list",
                        func: collection::sort, with: [with_named] },
    "reverse"      => { arity: Arity::Exact(1),    help: "reverse(x) returns a reversed list, string or byte string",
                        func: collection::reverse },
    "range"        => { arity: Arity::Range(1, 3), help: "range(end), range(start, end, step = 1) lists integers up to end",
                        func: collection::range },
    "min"          => { arity: Arity::AtLeast(1),  help: "min(values...) or min(list) is the smallest value",
                        func: collection::min },
    "max"          => { arity: Arity::AtLeast(1),  help: "max(values...) or max(list) is the largest value",
                        func: collection::max },
    "join"         => { arity: Arity::Range(1, 2), help: "join(list, separator = \"\") concatenates the elements",
                        func: string::join },
    "split"        => { arity: Arity::Range(1, 2), help: "split(s, separator = whitespace) splits a string",
                        func: string::split },
    "upper"        => { arity: Arity::Exact(1),    help: "upper(s) converts to upper case",
                        func: string::upper },
    "lower"        => { arity: Arity::Exact(1),    help: "lower(s) converts to lower case",
                        func: string::lower },
    "trim"         => { arity: Arity::Exact(1),    help: "trim(s) strips surrounding whitespace",
                        func: string::trim },
    "abs"          => { arity: Arity::Exact(1),    help: "abs(x) is the absolute value of a number",
                        func: math::abs },
    "hash"         => { arity: Arity::Exact(1),    help: "hash(x) is the hash key of a hashable value",
                        func: introspect::hash },
    "help"         => { arity: Arity::Range(0, 1), help: "help(x) describes a builtin, namespace or function",
                        func: introspect::help },
    "error"        => { arity: Arity::Exact(1),    help: "error(message) raises an error",
                        func: introspect::error },
    "assert"       => { arity: Arity::Range(1, 2), help: "assert(condition, message) raises unless condition is truthy",
                        func: introspect::assert },
    "regex"        => { arity: Arity::Exact(1),    help: "regex(pattern) compiles a regular expression",
                        func: regex::regex },
    "matches"      => { arity: Arity::Exact(2),    help: "matches(s, pattern) tests whether the pattern matches s",
                        func: regex::matches },
    "find_all"     => { arity: Arity::Exact(2),    help: "find_all(s, pattern) lists every match in s",
                        func: regex::find_all },
    "replace"      => { arity: Arity::Exact(3),    help: "replace(s, pattern, replacement) replaces every match",
                        func: regex::replace },
    "now_ms"       => { arity: Arity::Exact(0),    help: "now_ms() is the time in milliseconds since the epoch",
                        func: time::now_ms },
    "sleep"        => { arity: Arity::Exact(1),    help: "sleep(ms) pauses the current process",
                        func: time::sleep },
    "spawn"        => { arity: Arity::AtLeast(1),  help: "spawn(f, args...) runs f(args...) in a new process",
                        func: process::spawn },
    "self"         => { arity: Arity::Exact(0),    help: "self() is the current process",
                        func: process::current },
    "send"         => { arity: Arity::Exact(2),    help: "send(process, value) delivers a value to a process",
                        func: process::send },
    "recv"         => { arity: Arity::Range(1, 2), help: "recv(process, timeout_ms) takes the next message",
                        func: process::recv },
    "node_name"    => { arity: Arity::Exact(0),    help: "node_name() is the node processes run on",
                        func: process::node_name },
    "subscribe"    => { arity: Arity::Exact(1),    help: "subscribe(topic) creates a subscriber",
                        func: broker::subscribe },
    "publish"      => { arity: Arity::Exact(2),    help: "publish(topic, value) delivers to every subscriber of topic",
                        func: broker::publish },
    "poll"         => { arity: Arity::Range(1, 2), help: "poll(subscriber, timeout_ms) takes the next message",
                        func: broker::poll },
    "add_topic"    => { arity: Arity::Exact(2),    help: "add_topic(subscriber, topic) subscribes to another topic",
                        func: broker::add_topic },
    "remove_topic" => { arity: Arity::Exact(2),    help: "remove_topic(subscriber, topic) drops a topic",
                        func: broker::remove_topic },
    "unsubscribe"  => { arity: Arity::Exact(1),    help: "unsubscribe(subscriber) closes a subscriber",
                        func: broker::unsubscribe },
}

/// Members of the `proc` namespace, taken from the registry.
const PROC_MEMBERS: &[&str] = &["spawn", "self", "send", "recv"];

/// The process-wide name → builtin map.
struct Registry {
    builtins: IndexMap<String, Arc<Builtin>>,
    sealed:   bool,
}

impl Registry {
    fn with_core() -> Self {
        Self { builtins: core_builtins().into_iter()
                                        .map(|b| (b.name.clone(), Arc::new(b)))
                                        .collect(),
               sealed:   false, }
    }
}

static REGISTRY: OnceCell<RwLock<Registry>> = OnceCell::new();

fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| RwLock::new(Registry::with_core()))
}

/// Adds a host builtin to the registry, replacing any builtin of the same
/// name.
///
/// Builtins must be registered before the first evaluator is created; that
/// evaluator seals the registry.
///
/// # Errors
/// Returns a `HostError` once the registry is sealed.
///
/// # Example
/// ```
/// use blue::interpreter::{
///     evaluator::{core::Evaluator, function::core::register_builtin},
///     value::{
///         core::Value,
///         function::{Arity, Builtin},
///     },
/// };
///
/// register_builtin(Builtin::new("answer", Arity::Exact(0), "answer() is 42", |_, _| {
///     Ok(Value::Integer(42))
/// })).unwrap();
///
/// let mut evaluator = Evaluator::default();
/// assert_eq!(evaluator.run("answer()", "main").unwrap().as_i64(), Some(42));
/// ```
pub fn register_builtin(builtin: Builtin) -> EvalResult<()> {
    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    if registry.sealed {
        return Err(RuntimeError::host(format!("cannot register '{}': the builtin registry is sealed",
                                              builtin.name)));
    }
    tracing::debug!(builtin = %builtin.name, "register builtin");
    registry.builtins.insert(builtin.name.clone(), Arc::new(builtin));
    Ok(())
}

/// Looks up a registered builtin by name.
#[must_use]
pub fn lookup(name: &str) -> Option<Arc<Builtin>> {
    registry().read()
              .unwrap_or_else(PoisonError::into_inner)
              .builtins
              .get(name)
              .cloned()
}

/// Returns `true` once an evaluator has been created.
#[must_use]
pub fn is_sealed() -> bool {
    registry().read().unwrap_or_else(PoisonError::into_inner).sealed
}

/// Restores the registry to the core builtins and unseals it.
pub fn reset() {
    *registry().write().unwrap_or_else(PoisonError::into_inner) = Registry::with_core();
}

fn seal() -> Vec<Arc<Builtin>> {
    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    registry.sealed = true;
    registry.builtins.values().cloned().collect()
}

/// Binds every registered builtin, and the `math` and `proc` namespaces, in
/// the core frame. Seals the registry.
pub(crate) fn install_builtins(env: &mut Environment, core: FrameId) {
    let builtins = seal();
    for builtin in &builtins {
        env.define(core, &builtin.name, Value::Builtin(Arc::clone(builtin)));
    }

    let proc_members = PROC_MEMBERS.iter()
                                   .filter_map(|name| {
                                       builtins.iter()
                                               .find(|b| b.name == *name)
                                               .map(|b| ((*name).to_string(), Value::Builtin(Arc::clone(b))))
                                   })
                                   .collect();
    env.define(core, "proc", process::namespace(proc_members));
    env.define(core, "math", math::namespace());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_is_registered_once() {
        let builtins = core_builtins();
        assert_eq!(builtins.len(), BUILTIN_FUNCTIONS.len());
        let mut names = BUILTIN_FUNCTIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_FUNCTIONS.len());
    }

    #[test]
    fn modifiers_are_applied() {
        let builtins = core_builtins();
        let push = builtins.iter().find(|b| b.name == "push").unwrap();
        assert!(push.mutates && !push.accepts_named);
        let sort = builtins.iter().find(|b| b.name == "sort").unwrap();
        assert!(sort.accepts_named && !sort.mutates);
    }
}
