/// The builtin registry.
///
/// Declares the builtin table, lets hosts register their own builtins before
/// the first evaluator starts, and binds everything in the core frame.
pub mod core;

/// `print` and `println`.
///
/// Write the display form of their arguments to standard output.
pub mod print;
/// Conversions between value types: `str`, `int`, `float`, `bytes`,
/// `list`, `set` and the arbitrary-precision constructors.
pub mod convert;
/// `type`, `help`, `hash`, `assert` and `error`.
pub mod introspect;
/// Builtins over lists, maps and sets.
///
/// `push`, `pop`, `insert` and `remove` change their first argument in
/// place; `sort` and `reverse` return new lists.
pub mod collection;
/// String helpers.
pub mod string;
/// Regular expressions.
///
/// Patterns are given as regex literals, `regex()` values or strings.
pub mod regex;
/// `abs` and the `math` namespace.
pub mod math;
/// `now_ms` and `sleep`, backed by the host clock.
pub mod time;
/// Spawning processes and message passing.
///
/// Also provides the `proc` namespace and the `send`/`recv` members of
/// process handles.
pub mod process;
/// Publish/subscribe through the global broker.
pub mod broker;
