use std::mem;

use tracing::trace;

use crate::{
    ast::{Expression, Program},
    error::ParseError,
    interpreter::{
        lexer::Lexer,
        token::{Position, Token, TokenKind},
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Binding power of operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Start of an expression.
    Lowest,
    /// `=` and compound assignments (right-associative).
    Assign,
    /// `or`
    Or,
    /// `and`
    And,
    /// `==`, `!=`
    Equals,
    /// `<`, `<=`, `>`, `>=`, `in`, `notin`
    Relational,
    /// `..`, `..<`
    Range,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `<<`, `>>`
    Shift,
    /// `+`, `-`
    Sum,
    /// `*`, `/`, `//`, `%`
    Product,
    /// `**` (right-associative)
    Power,
    /// `-x`, `!x`, `not x`, `~x`
    Prefix,
    /// `f(x)`, `xs[i]`, `a.b`
    Call,
}

impl Precedence {
    /// The binding power of a token in infix position.
    #[must_use]
    pub const fn of(kind: TokenKind) -> Self {
        match kind {
            k if k.is_assignment() => Self::Assign,
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Eq | TokenKind::NotEq => Self::Equals,
            TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::NotIn => Self::Relational,
            TokenKind::DotDot | TokenKind::DotDotLt => Self::Range,
            TokenKind::Pipe => Self::BitOr,
            TokenKind::Caret => Self::BitXor,
            TokenKind::Amp => Self::BitAnd,
            TokenKind::Shl | TokenKind::Shr => Self::Shift,
            TokenKind::Plus | TokenKind::Minus => Self::Sum,
            TokenKind::Star | TokenKind::Slash | TokenKind::FloorDiv | TokenKind::Percent => {
                Self::Product
            },
            TokenKind::Pow => Self::Power,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => Self::Call,
            _ => Self::Lowest,
        }
    }

    /// The precedence used for the right operand of a right-associative
    /// operator.
    #[must_use]
    pub const fn lower(self) -> Self {
        match self {
            Self::Power => Self::Product,
            _ => Self::Lowest,
        }
    }
}

/// A Pratt parser over a [`Lexer`].
///
/// The parser keeps a current and a peek token. Every rule starts with `cur`
/// on the first token of its construct and leaves `cur` on the construct's
/// last token. Errors are collected rather than returned, so a whole program
/// is always parsed to the end of input.
///
/// # Example
/// ```
/// use blue::interpreter::{lexer::Lexer, parser::Parser};
///
/// let mut parser = Parser::new(Lexer::new("var x = 1 + 2 * 3", "<doc>"));
/// let program = parser.parse_program();
///
/// assert!(parser.errors().is_empty());
/// assert_eq!(program.to_string(), "var x = (1 + (2 * 3))");
/// ```
pub struct Parser<'source> {
    pub(super) lexer:  Lexer<'source>,
    pub(super) cur:    Token,
    pub(super) peek:   Token,
    pub(super) errors: Vec<ParseError>,
}

impl<'source> Parser<'source> {
    /// Creates a parser and primes the current and peek tokens.
    #[must_use]
    pub fn new(lexer: Lexer<'source>) -> Self {
        let start = Token::new(TokenKind::Eof, "", Position::new(lexer.file(), 1, 1));
        let mut parser = Self { lexer,
                                cur: start.clone(),
                                peek: start,
                                errors: Vec::new() };
        parser.advance();
        parser.advance();
        parser
    }

    /// Errors collected so far, in source order.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Consumes the parser, returning the collected errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Parses statements until end of input.
    ///
    /// Statements that fail to parse are skipped up to the next statement
    /// boundary; the failure is recorded in [`Parser::errors`].
    pub fn parse_program(&mut self) -> Program {
        trace!(file = %self.lexer.file(), "parsing program");
        let mut program = Program::default();

        while !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(statement) => program.statements.push(statement),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                },
            }
            self.advance();
        }

        program
    }

    /// Parses an expression whose operators bind tighter than `precedence`.
    ///
    /// An operator only continues the expression when it sits on the same
    /// line as the token before it; a newline ends the expression.
    pub fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon)
              && precedence < Precedence::of(self.peek.kind)
              && self.peek.line() == self.cur.line()
        {
            self.advance();
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    /// Moves to the next token. A lex error is recorded and replaced by end
    /// of input.
    pub(super) fn advance(&mut self) {
        let next = match self.lexer.next_token() {
            Ok(token) => token,
            Err(e) => {
                let eof = Token::new(TokenKind::Eof, "", e.position.clone());
                self.errors.push(e.into());
                eof
            },
        };
        self.cur = mem::replace(&mut self.peek, next);
    }

    pub(super) fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    pub(super) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    /// Advances if the peek token has the given kind, fails otherwise.
    pub(super) fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&self.peek, &format!("'{}'", kind.symbol())))
        }
    }

    /// Builds an "expected X, found Y" error for `found`.
    pub(super) fn unexpected(&self, found: &Token, expected: &str) -> ParseError {
        let found_text = if found.is(TokenKind::Eof) {
            found.kind.symbol().to_string()
        } else {
            format!("'{}'", found.literal)
        };
        ParseError::UnexpectedToken { expected: expected.to_string(),
                                      found:    found_text,
                                      position: found.position.clone(), }
    }

    /// Skips the rest of a broken statement: up to a `;`, the closing brace
    /// of the enclosing block, or the end of the line.
    pub(super) fn synchronize(&mut self) {
        let line = self.cur.line();
        loop {
            if self.cur_is(TokenKind::Semicolon) || self.cur_is(TokenKind::Eof) {
                return;
            }
            if self.peek_is(TokenKind::Eof)
               || self.peek_is(TokenKind::RBrace)
               || self.peek.line() > line
            {
                return;
            }
            self.advance();
        }
    }
}

/// Parses `source` into a program.
///
/// # Errors
/// Returns every collected [`ParseError`] if any statement failed to parse.
///
/// # Example
/// ```
/// use blue::interpreter::parser::parse;
///
/// assert!(parse("val x = 1; x + 1", "<doc>").is_ok());
///
/// let errors = parse("val = 1", "<doc>").unwrap_err();
/// assert_eq!(errors[0].line(), 1);
/// ```
pub fn parse(source: &str, file: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(source, file));
    let program = parser.parse_program();
    let errors = parser.into_errors();
    if errors.is_empty() { Ok(program) } else { Err(errors) }
}
