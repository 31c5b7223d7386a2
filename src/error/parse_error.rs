use crate::{error::LexError, interpreter::token::Position};

/// Represents all errors that can occur while building the syntax tree.
///
/// Every variant carries the position of the token that triggered it, so
/// errors always point at a valid `line >= 1, column >= 1` location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The scanner failed; parsing continues with an end-of-input token.
    #[error("ParserError: {0}")]
    Lex(LexError),
    /// A specific token was required but another one was found.
    #[error("ParserError: expected {expected}, found {found} ({position})")]
    UnexpectedToken {
        /// Description of what the grammar needed.
        expected: String,
        /// Literal of the token that was found.
        found:    String,
        /// Where it was found.
        position: Position,
    },
    /// A token that cannot start an expression.
    #[error("ParserError: no prefix parse rule for {found} ({position})")]
    NoPrefixRule {
        /// Literal of the token that was found.
        found:    String,
        /// Where it was found.
        position: Position,
    },
    /// The left side of an assignment is neither a name nor an index.
    #[error("ParserError: invalid assignment target {target} ({position})")]
    InvalidAssignmentTarget {
        /// Re-printed form of the rejected target.
        target:   String,
        /// Position of the assignment operator.
        position: Position,
    },
    /// A literal that does not denote a value (e.g. a malformed number or
    /// regex).
    #[error("ParserError: invalid literal {literal}: {reason} ({position})")]
    InvalidLiteral {
        /// The literal text.
        literal:  String,
        /// Why it was rejected.
        reason:   String,
        /// Where the literal starts.
        position: Position,
    },
    /// Any other malformed construct.
    #[error("ParserError: {message} ({position})")]
    Malformed {
        /// Details about the problem.
        message:  String,
        /// Where it was detected.
        position: Position,
    },
}

impl ParseError {
    /// Creates a [`ParseError::Malformed`] error.
    #[must_use]
    pub fn malformed(message: impl Into<String>, position: &Position) -> Self {
        Self::Malformed { message:  message.into(),
                          position: position.clone(), }
    }

    /// The position the error points at.
    #[must_use]
    pub const fn position(&self) -> &Position {
        match self {
            Self::Lex(e) => &e.position,
            Self::UnexpectedToken { position, .. }
            | Self::NoPrefixRule { position, .. }
            | Self::InvalidAssignmentTarget { position, .. }
            | Self::InvalidLiteral { position, .. }
            | Self::Malformed { position, .. } => position,
        }
    }

    /// 1-indexed line of the error.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.position().line
    }

    /// 1-indexed column of the error.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.position().column
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}
