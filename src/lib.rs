//! # blue
//!
//! blue is a dynamically-typed scripting language with a tree-walking
//! interpreter written in Rust. Programs are lexed, parsed into a syntax tree
//! with a Pratt parser and evaluated directly, with closures, modules,
//! arbitrary-precision numbers, lightweight processes that communicate
//! through mailboxes, and a publish/subscribe broker.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    config::Config,
    error::Error,
    interpreter::{
        broker::Broker,
        evaluator::{core::Evaluator, function},
        host::Host,
        process::table,
        value::core::Value,
    },
};

/// Defines the structure of parsed code.
///
/// Declares the statement and expression node types built by the parser and
/// walked by the evaluator. Every node carries the token it starts at and
/// prints back as source text.
pub mod ast;
/// Interpreter settings read from the environment.
pub mod config;
/// Provides unified error types for lexing, parsing and evaluation.
///
/// # Responsibilities
/// - Defines the error types of every stage.
/// - Attaches source positions and the runtime error taxonomy.
/// - Wraps both in the `Error` returned by the entry points.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// Ties together tokens, lexing, parsing, values, environments, evaluation,
/// processes, the broker and the host capabilities.
pub mod interpreter;
/// General utilities for safe numeric conversion and helpers.
pub mod util;

pub use interpreter::evaluator::function::core::register_builtin;

/// Evaluates a program with a fresh evaluator and returns the value of its
/// last statement.
///
/// # Errors
/// Returns every parse error, or the runtime error that nothing caught.
///
/// # Example
/// ```
/// use blue::get_result;
///
/// let value = get_result("val xs = [1, 2, 3]\nxs[0] + xs[-1]").unwrap();
/// assert_eq!(value.as_i64(), Some(4));
///
/// // 'x' is not defined
/// assert!(get_result("x + 1").is_err());
/// ```
pub fn get_result(source: &str) -> Result<Value, Error> {
    Evaluator::default().run(source, "main")
}

/// Evaluates `source`, named `file` in diagnostics, with the given
/// configuration and host, and returns the value of its last statement.
///
/// A runtime error is returned already rendered with its trace and the
/// source lines it points at.
///
/// # Errors
/// Returns the rendered parse errors or runtime error.
pub fn run_source(source: &str, file: &str, config: Config, host: Host) -> Result<Value, String> {
    let mut evaluator = Evaluator::new(host, config);
    evaluator.run(source, file).map_err(|error| match error {
                                   Error::Runtime(e) => e.render(evaluator.sources()),
                                   parse @ Error::Parse(_) => parse.to_string(),
                               })
}

/// Resets process-wide state: empties the process table, closes every
/// subscriber and restores the builtin registry to the core builtins.
///
/// Meant for tests and embedders that run several independent programs in
/// one OS process.
pub fn clear_global_state() {
    table::clear();
    Broker::global().clear();
    function::core::reset();
}
