use std::{fmt, sync::Arc};

use logos::{FilterResult, Logos};

use crate::error::LexErrorKind;

/// Source location of the first character of a lexeme.
///
/// Lines and columns are 1-indexed; columns count Unicode scalar values, not
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// The file (or synthetic source name) the lexeme was read from.
    pub file:   Arc<str>,
    /// 1-indexed line number.
    pub line:   usize,
    /// 1-indexed column number.
    pub column: usize,
}

impl Position {
    /// Creates a position inside `file`.
    #[must_use]
    pub fn new(file: &Arc<str>, line: usize, column: usize) -> Self {
        Self { file: Arc::clone(file),
               line,
               column }
    }
}

/// A position outside any source file, used for calls made by the host.
impl Default for Position {
    fn default() -> Self {
        Self { file:   Arc::from("<host>"),
               line:   1,
               column: 1, }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A lexeme together with its kind, literal text and position.
///
/// For string-like tokens `literal` holds the processed payload (escapes
/// resolved, delimiters stripped); for every other kind it is the source text
/// of the lexeme.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of lexeme this is.
    pub kind:     TokenKind,
    /// Literal text of the lexeme.
    pub literal:  String,
    /// Where the lexeme starts.
    pub position: Position,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Self { kind,
               literal: literal.into(),
               position }
    }

    /// Creates a token that does not originate from source text, used for
    /// nodes synthesized by the parser.
    #[must_use]
    pub fn synthetic(kind: TokenKind, literal: impl Into<String>, like: &Self) -> Self {
        Self::new(kind, literal, like.position.clone())
    }

    /// Returns `true` if the token has the given kind.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// 1-indexed line of the token.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.position.line
    }
}

/// Every kind of lexeme the language knows about.
///
/// This enumeration is shared by the lexer and the parser. The logos
/// attributes describe how the raw scanner recognizes each kind; kinds without
/// attributes (`ImportPath`, `Eof`) are produced by the [`Lexer`] wrapper.
///
/// [`Lexer`]: crate::interpreter::lexer::Lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexErrorKind)]
pub enum TokenKind {
    /// Float literal such as `1.5` or `2.0e-3`.
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    Float,
    /// Decimal integer literal such as `42` or `1_000`.
    #[regex(r"[0-9][0-9_]*")]
    Int,
    /// `0xFF`
    #[regex(r"0x[0-9a-fA-F][0-9a-fA-F_]*")]
    Hex,
    /// `0o77`
    #[regex(r"0o[0-7][0-7_]*")]
    Octal,
    /// `0b1010`
    #[regex(r"0b[01][01_]*")]
    Binary,
    /// `0u42`, an unsigned decimal literal.
    #[regex(r"0u[0-9][0-9_]*")]
    UInt,
    /// Double- or single-quoted string. Quotes inside `#{...}` belong to the
    /// interpolated expression.
    #[token("\"", quoted_string)]
    #[token("'", quoted_string)]
    String,
    /// Triple double-quoted raw string.
    #[token("\"\"\"", raw_string)]
    RawString,
    /// Backtick-delimited command string.
    #[regex(r"`[^`]*`", allow_greedy = true)]
    ExecString,
    /// `r/pattern/`
    #[regex(r"r/([^/\\\n]|\\.)*/", allow_greedy = true)]
    Regex,
    /// Identifiers; the first rune is a letter, `_`, or `?` followed by a
    /// letter.
    #[regex(r"[\p{L}_][\p{L}\p{N}_?]*")]
    #[regex(r"\?[\p{L}_][\p{L}\p{N}_?]*")]
    Ident,
    /// The dotted path following `import`.
    ImportPath,

    /// `var`
    #[token("var")]
    Var,
    /// `val`
    #[token("val")]
    Val,
    /// `const`
    #[token("const")]
    Const,
    /// `fun`
    #[token("fun")]
    Fun,
    /// `return`
    #[token("return")]
    Return,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `match`
    #[token("match")]
    Match,
    /// `for`
    #[token("for")]
    For,
    /// `in`
    #[token("in")]
    In,
    /// `notin`
    #[token("notin")]
    NotIn,
    /// `and`
    #[token("and")]
    And,
    /// `or`
    #[token("or")]
    Or,
    /// `not`
    #[token("not")]
    Not,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `null`
    #[token("null")]
    Null,
    /// `import`
    #[token("import")]
    Import,
    /// `try`
    #[token("try")]
    Try,
    /// `catch`
    #[token("catch")]
    Catch,
    /// `finally`
    #[token("finally")]
    Finally,
    /// `eval`
    #[token("eval")]
    Eval,
    /// `break`
    #[token("break")]
    Break,
    /// `continue`
    #[token("continue")]
    Continue,

    /// `=`
    #[token("=")]
    Assign,
    /// `==`
    #[token("==")]
    Eq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,
    /// `//=`
    #[token("//=")]
    FloorDivAssign,
    /// `%=`
    #[token("%=")]
    PercentAssign,
    /// `**=`
    #[token("**=")]
    PowAssign,
    /// `&=`
    #[token("&=")]
    AmpAssign,
    /// `|=`
    #[token("|=")]
    PipeAssign,
    /// `^=`
    #[token("^=")]
    CaretAssign,
    /// `>>=`
    #[token(">>=")]
    ShrAssign,
    /// `<<=`
    #[token("<<=")]
    ShlAssign,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `//`
    #[token("//")]
    FloorDiv,
    /// `%`
    #[token("%")]
    Percent,
    /// `**`
    #[token("**")]
    Pow,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `^`
    #[token("^")]
    Caret,
    /// `~`
    #[token("~")]
    Tilde,
    /// `<<`
    #[token("<<")]
    Shl,
    /// `>>`
    #[token(">>")]
    Shr,
    /// `.`
    #[token(".")]
    Dot,
    /// `..`
    #[token("..")]
    DotDot,
    /// `..<`
    #[token("..<")]
    DotDotLt,
    /// `...`
    #[token("...")]
    Ellipsis,
    /// `=>`
    #[token("=>")]
    FatArrow,
    /// `!`
    #[token("!")]
    Bang,
    /// `?`
    #[token("?")]
    Question,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `:`
    #[token(":")]
    Colon,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,

    /// `#` line comments and `### ... ###` block comments.
    #[token("#", comment)]
    Comment,
    /// Whitespace, newlines included; lines are recovered from offsets.
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// The surface text (or a short description) of the kind, used in
    /// diagnostics and when re-printing operators.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Float => "float literal",
            Self::Int => "integer literal",
            Self::Hex => "hex literal",
            Self::Octal => "octal literal",
            Self::Binary => "binary literal",
            Self::UInt => "unsigned literal",
            Self::String => "string",
            Self::RawString => "raw string",
            Self::ExecString => "exec string",
            Self::Regex => "regex literal",
            Self::Ident => "identifier",
            Self::ImportPath => "import path",
            Self::Var => "var",
            Self::Val => "val",
            Self::Const => "const",
            Self::Fun => "fun",
            Self::Return => "return",
            Self::If => "if",
            Self::Else => "else",
            Self::Match => "match",
            Self::For => "for",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Import => "import",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Eval => "eval",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Assign => "=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::FloorDivAssign => "//=",
            Self::PercentAssign => "%=",
            Self::PowAssign => "**=",
            Self::AmpAssign => "&=",
            Self::PipeAssign => "|=",
            Self::CaretAssign => "^=",
            Self::ShrAssign => ">>=",
            Self::ShlAssign => "<<=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::FloorDiv => "//",
            Self::Percent => "%",
            Self::Pow => "**",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::DotDotLt => "..<",
            Self::Ellipsis => "...",
            Self::FatArrow => "=>",
            Self::Bang => "!",
            Self::Question => "?",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comment => "comment",
            Self::Whitespace => "whitespace",
            Self::Eof => "end of input",
        }
    }

    /// Returns `true` for `=` and every compound assignment operator.
    #[must_use]
    pub const fn is_assignment(self) -> bool {
        matches!(self,
                 Self::Assign
                 | Self::PlusAssign
                 | Self::MinusAssign
                 | Self::StarAssign
                 | Self::SlashAssign
                 | Self::FloorDivAssign
                 | Self::PercentAssign
                 | Self::PowAssign
                 | Self::AmpAssign
                 | Self::PipeAssign
                 | Self::CaretAssign
                 | Self::ShrAssign
                 | Self::ShlAssign)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Consumes a raw string body up to and including the closing `"""`.
fn raw_string(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), LexErrorKind> {
    match lex.remainder().find("\"\"\"") {
        Some(end) => {
            lex.bump(end + 3);
            FilterResult::Emit(())
        },
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(LexErrorKind::UnterminatedString)
        },
    }
}

/// Scans the rest of a quoted string whose opening quote was just matched.
fn quoted_string(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), LexErrorKind> {
    let quote = if lex.slice() == "'" { '\'' } else { '"' };
    let rest = lex.remainder();

    match string_end(rest, quote) {
        Some(end) => {
            lex.bump(end + 1);
            FilterResult::Emit(())
        },
        None => {
            lex.bump(rest.len());
            FilterResult::Error(LexErrorKind::UnterminatedString)
        },
    }
}

/// Byte index of the `quote` closing a string body, skipping escapes and
/// interpolations.
fn string_end(body: &str, quote: char) -> Option<usize> {
    let mut i = 0;

    while let Some(c) = body[i..].chars().next() {
        match c {
            '\\' => i += 1 + body[i + 1..].chars().next().map_or(0, char::len_utf8),
            c if c == quote => return Some(i),
            '#' if body[i + 1..].starts_with('{') => match interpolation_end(&body[i + 2..]) {
                Some(end) => i += 2 + end + 1,
                None => i += 1,
            },
            _ => i += c.len_utf8(),
        }
    }
    None
}

/// Byte index of the `}` closing an interpolation body, skipping nested
/// braces and quoted strings (which may interpolate in turn).
pub(crate) fn interpolation_end(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;

    while let Some(c) = body[i..].chars().next() {
        match c {
            '"' | '\'' => i += 1 + string_end(&body[i + 1..], c)?,
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {},
        }
        i += c.len_utf8();
    }
    None
}

/// Skips a `#` line comment or a `### ... ###` block comment.
fn comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), LexErrorKind> {
    let rest = lex.remainder();

    if let Some(body) = rest.strip_prefix("##") {
        return match body.find("###") {
            Some(end) => {
                lex.bump(2 + end + 3);
                FilterResult::Skip
            },
            None => {
                lex.bump(rest.len());
                FilterResult::Error(LexErrorKind::UnterminatedComment)
            },
        };
    }

    let end = rest.find('\n').unwrap_or(rest.len());
    lex.bump(end);
    FilterResult::Skip
}
