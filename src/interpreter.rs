/// Tokens and source positions.
///
/// Declares the logos-derived token kinds together with the `Token` and
/// `Position` types shared by every later stage.
pub mod token;
/// The lexer turns source text into positioned tokens.
///
/// Wraps the logos scanner with line and column tracking, the import-path
/// mode and string unescaping.
///
/// # Responsibilities
/// - Produces tokens with 1-indexed line and column positions.
/// - Decodes escapes in string literals.
/// - Reports illegal characters and unterminated literals.
pub mod lexer;
/// The parser builds the syntax tree from tokens.
///
/// A Pratt parser: every token kind has a prefix rule, an infix rule, or
/// both, selected by binding power. Errors are collected and parsing
/// resynchronizes at the next statement.
///
/// # Responsibilities
/// - Converts tokens into statements and expressions.
/// - Decides where statements end, on `;` or a line break.
/// - Reports every syntax error with its position.
pub mod parser;
/// The value module defines the runtime data types.
///
/// Declares the `Value` enum, the numeric tower, the hashing and equality
/// contract, the insertion-ordered map and set, and function values.
pub mod value;
/// Frames holding variable bindings.
///
/// Frames live in an arena owned by one evaluator and link to their
/// enclosing frame.
pub mod environment;
/// The evaluator executes the syntax tree.
///
/// Walks statements and expressions, applies operators, calls functions and
/// builtins, and reports runtime errors with a trace of source positions.
///
/// # Responsibilities
/// - Evaluates every statement and expression form.
/// - Manages scopes, closures, imports and control flow.
/// - Runs builtins, including spawning processes.
pub mod evaluator;
/// Lightweight processes.
///
/// A process is an addressable mailbox; the worker running its body owns a
/// forked evaluator.
pub mod process;
/// Publish/subscribe broker.
///
/// Routes messages to subscribers by topic, each subscriber with a private
/// mailbox.
pub mod broker;
/// Capabilities consumed from the embedding environment.
///
/// Source loading for imports, a scheduler for process workers and a clock,
/// with default implementations backed by the filesystem, OS threads and the
/// system time.
pub mod host;
