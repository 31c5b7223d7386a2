use crate::interpreter::token::Position;

/// The ways scanning can fail.
///
/// `IllegalCharacter` is the default because it is what the scanner reports
/// for any input no token pattern accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    /// A character that starts no token.
    #[default]
    #[error("illegal character")]
    IllegalCharacter,
    /// A string, raw string or exec string without its closing delimiter.
    #[error("unterminated string")]
    UnterminatedString,
    /// A `\x` escape not followed by two hex digits.
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// A `###` block comment without its closing `###`.
    #[error("unterminated comment")]
    UnterminatedComment,
    /// `import` not followed by a path.
    #[error("expected an import path")]
    MissingImportPath,
}

/// A scanning failure. The lexer stops producing tokens after the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("LexError: {kind}: {lexeme:?} ({position})")]
pub struct LexError {
    /// What went wrong.
    pub kind:     LexErrorKind,
    /// The offending source text (truncated to the first line).
    pub lexeme:   String,
    /// Where the offending text starts.
    pub position: Position,
}

impl LexError {
    /// Creates a lex error for `lexeme` at `position`.
    #[must_use]
    pub fn new(kind: LexErrorKind, lexeme: &str, position: Position) -> Self {
        let lexeme = lexeme.lines().next().unwrap_or_default().to_string();
        Self { kind,
               lexeme,
               position }
    }

    /// 1-indexed line of the error.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.position.line
    }

    /// 1-indexed column of the error.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.position.column
    }
}
