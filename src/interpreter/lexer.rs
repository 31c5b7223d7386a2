use std::sync::Arc;

use logos::Logos;

use crate::{
    error::{LexError, LexErrorKind},
    interpreter::token::{Position, Token, TokenKind, interpolation_end},
};

/// Position-tracking scanner on top of the logos-derived [`TokenKind`]
/// automaton.
///
/// The raw scanner only knows byte spans; this wrapper turns them into
/// [`Token`]s with 1-indexed line and column numbers, resolves string escapes,
/// strips literal delimiters and implements the import-path mode: right after
/// an `import` keyword the next token is read with a relaxed alphabet that
/// includes `.`, `/` and `-`.
///
/// After the first error the lexer only produces end-of-input tokens.
///
/// # Example
/// ```
/// use blue::interpreter::{lexer::Lexer, token::TokenKind};
///
/// let mut lexer = Lexer::new("var x = 0x1F", "<doc>");
/// let kinds: Vec<_> = std::iter::from_fn(|| {
///                         let token = lexer.next_token().ok()?;
///                         (token.kind != TokenKind::Eof).then_some(token.kind)
///                     }).collect();
///
/// assert_eq!(kinds,
///            [TokenKind::Var, TokenKind::Ident, TokenKind::Assign, TokenKind::Hex]);
/// ```
pub struct Lexer<'source> {
    inner:              logos::Lexer<'source, TokenKind>,
    source:             &'source str,
    file:               Arc<str>,
    line_starts:        Vec<usize>,
    line_offset:        usize,
    column_offset:      usize,
    expect_import_path: bool,
    finished:           bool,
}

impl<'source> Lexer<'source> {
    /// Creates a lexer over `source`, attributing positions to `file`.
    #[must_use]
    pub fn new(source: &'source str, file: impl Into<Arc<str>>) -> Self {
        let line_starts = std::iter::once(0).chain(source.match_indices('\n').map(|(i, _)| i + 1))
                                            .collect();

        Self { inner: TokenKind::lexer(source),
               source,
               file: file.into(),
               line_starts,
               line_offset: 0,
               column_offset: 0,
               expect_import_path: false,
               finished: false }
    }

    /// Creates a lexer for a fragment embedded in another source, such as an
    /// interpolated expression. Positions are reported relative to `origin`.
    #[must_use]
    pub fn with_origin(source: &'source str, origin: &Position) -> Self {
        let mut lexer = Self::new(source, Arc::clone(&origin.file));
        lexer.line_offset = origin.line.saturating_sub(1);
        lexer.column_offset = origin.column.saturating_sub(1);
        lexer
    }

    /// The file name positions are attributed to.
    #[must_use]
    pub const fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Scans and returns the next token.
    ///
    /// # Errors
    /// Returns a [`LexError`] for illegal characters, unterminated strings or
    /// comments, invalid `\x` escapes and a missing import path.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.finished {
            return Ok(self.eof());
        }
        if self.expect_import_path {
            self.expect_import_path = false;
            return self.import_path();
        }

        match self.inner.next() {
            None => {
                self.finished = true;
                Ok(self.eof())
            },
            Some(Ok(kind)) => {
                let span = self.inner.span();
                let slice = self.inner.slice();
                let position = self.position_at(span.start);

                let literal = match kind {
                    TokenKind::String => unescape(&slice[1..slice.len() - 1]).map_err(|_| {
                                             self.finished = true;
                                             LexError::new(LexErrorKind::InvalidEscape,
                                                           slice,
                                                           position.clone())
                                         })?,
                    TokenKind::RawString => slice[3..slice.len() - 3].to_string(),
                    TokenKind::ExecString => slice[1..slice.len() - 1].to_string(),
                    TokenKind::Regex => slice[2..slice.len() - 1].to_string(),
                    _ => slice.to_string(),
                };

                if kind == TokenKind::Import {
                    self.expect_import_path = true;
                }

                Ok(Token::new(kind, literal, position))
            },
            Some(Err(kind)) => {
                self.finished = true;
                let slice = self.inner.slice();
                let kind = match kind {
                    LexErrorKind::IllegalCharacter if slice.starts_with(['"', '\'', '`']) => {
                        LexErrorKind::UnterminatedString
                    },
                    other => other,
                };
                Err(LexError::new(kind, slice, self.position_at(self.inner.span().start)))
            },
        }
    }

    /// Reads the dotted path that follows `import`.
    fn import_path(&mut self) -> Result<Token, LexError> {
        let rest = self.inner.remainder();
        let body = rest.trim_start_matches([' ', '\t']);
        let leading = rest.len() - body.len();
        let len = body.find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | '-')))
                      .unwrap_or(body.len());
        let position = self.position_at(self.inner.span().end + leading);

        if len == 0 {
            self.finished = true;
            return Err(LexError::new(LexErrorKind::MissingImportPath, body, position));
        }

        let path = body[..len].to_string();
        self.inner.bump(leading + len);
        Ok(Token::new(TokenKind::ImportPath, path, position))
    }

    fn eof(&self) -> Token {
        Token::new(TokenKind::Eof, "", self.position_at(self.source.len()))
    }

    /// Converts a byte offset into a 1-indexed line/column position.
    fn position_at(&self, offset: usize) -> Position {
        let index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[index];
        let mut column = self.source[start..offset].chars().count() + 1;
        if index == 0 {
            column += self.column_offset;
        }
        Position::new(&self.file, index + 1 + self.line_offset, column)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            other => Some(other),
        }
    }
}

/// Scans a whole source into a token vector (without the trailing EOF).
///
/// # Errors
/// Returns the first [`LexError`] encountered.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, file).collect()
}

/// Resolves the escape sequences of a quoted string body.
///
/// Interpolated expressions are copied untouched so their own strings keep
/// their escapes. Unknown escapes are kept verbatim; `\x` must be followed by
/// exactly two hex digits.
fn unescape(body: &str) -> Result<String, ()> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == '#' && chars.as_str().starts_with('{') {
            let rest = &chars.as_str()[1..];
            if let Some(end) = interpolation_end(rest) {
                out.push_str("#{");
                out.push_str(&rest[..=end]);
                chars = rest[end + 1..].chars();
                continue;
            }
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('x') => {
                let hi = chars.next().and_then(|c| c.to_digit(16)).ok_or(())?;
                let lo = chars.next().and_then(|c| c.to_digit(16)).ok_or(())?;
                let byte = u8::try_from(hi * 16 + lo).map_err(|_| ())?;
                out.push(char::from(byte));
            },
            Some(other) => {
                out.push('\\');
                out.push(other);
            },
            None => out.push('\\'),
        }
    }

    Ok(out)
}
