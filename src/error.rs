/// Scanning errors.
///
/// Defines the failures the lexer can report: illegal characters,
/// unterminated literals and comments, and malformed escapes.
pub mod lex_error;
/// Parsing errors.
///
/// Defines all error types that can occur while turning tokens into the syntax
/// tree. The parser collects them instead of stopping at the first one.
pub mod parse_error;
/// Runtime errors.
///
/// Contains the error taxonomy raised during evaluation: name, type, arity,
/// range, arithmetic, process, import, host and control-flow failures.
pub mod runtime_error;

pub use lex_error::{LexError, LexErrorKind};
pub use parse_error::ParseError;
pub use runtime_error::{ErrorKind, RuntimeError};

/// Any failure of the parse-then-evaluate pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The program did not parse; every collected error is kept.
    #[error("{}", render_parse_errors(.0))]
    Parse(Vec<ParseError>),
    /// Evaluation raised an error that nothing caught.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    errors.iter()
          .map(ToString::to_string)
          .collect::<Vec<_>>()
          .join("\n")
}
