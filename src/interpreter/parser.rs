/// Parser state, token cursor, precedence table and the Pratt loop.
///
/// Holds the lexer, the current and peek tokens and the collected errors, and
/// drives expression parsing by operator precedence.
pub mod core;

/// Prefix rules.
///
/// Parses everything that can start an expression: literals, identifiers,
/// prefix operators, grouping, and the keyword-introduced expressions (`if`,
/// `match`, `for`, `fun`, `eval`, `try`).
pub mod unary;

/// Infix rules.
///
/// Parses binary operators, calls, indexing, member access and assignment.
pub mod binary;

/// Block parsing.
///
/// Parses brace-delimited statement sequences with local error recovery.
pub mod block;

/// Collection literals.
///
/// Parses list, map, set and struct literals and their comprehension forms.
pub mod collection;

/// Parser utilities.
///
/// Numeric literal decoding, string interpolation splitting and other helpers
/// shared by the rules.
pub mod utils;

/// Statement parsing.
///
/// Implements `var`, `val`/`const`, named functions, `return`, `break`,
/// `continue`, `import`, blocks and expression statements.
pub mod statement;

pub use self::core::{ParseResult, Parser, Precedence, parse};
