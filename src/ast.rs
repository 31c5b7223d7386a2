use std::{fmt, sync::Arc};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use regex::Regex;

use crate::interpreter::token::{Token, TokenKind};

/// The root of a parsed source: an ordered sequence of statements.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}

/// A brace-delimited sequence of statements.
#[derive(Debug, Clone)]
pub struct BlockStatement {
    /// The opening `{` token.
    pub token:      Token,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

impl BlockStatement {
    /// Returns `true` if a statement directly inside this block introduces a
    /// binding, which is when evaluating it needs a fresh frame.
    #[must_use]
    pub fn declares_bindings(&self) -> bool {
        self.statements
            .iter()
            .any(|s| matches!(s, Statement::Var { .. } | Statement::Val { .. } | Statement::Function { .. }))
    }
}

/// A function parameter, optionally with a default value expression.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name:    String,
    /// Default value, evaluated at call time in the call's frame.
    pub default: Option<Expression>,
}

/// A function literal, shared between the syntax tree and every closure
/// created from it.
#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    /// The `fun` token.
    pub token:      Token,
    /// Name for `fun name(...)` statements.
    pub name:       Option<String>,
    /// Parameters; defaulted ones follow bare ones.
    pub parameters: Vec<Parameter>,
    /// Function body.
    pub body:       BlockStatement,
}

/// A piece of a string literal: either plain text or an interpolated
/// `#{...}` expression.
#[derive(Debug, Clone)]
pub enum StringPart {
    /// Literal text.
    Text(String),
    /// A parsed `#{...}` region.
    Interpolation(Expression),
}

/// The `for ... in ... [if ...]` tail shared by every comprehension form.
#[derive(Debug, Clone)]
pub struct ComprehensionClause {
    /// One or two loop bindings.
    pub bindings: Vec<String>,
    /// The collection iterated over.
    pub iterable: Expression,
    /// Optional filter condition.
    pub filter:   Option<Expression>,
}

/// One arm of a `match` expression.
#[derive(Debug, Clone)]
pub struct MatchArm {
    /// Alternatives; the arm fires if any of them matches. `_` always
    /// matches.
    pub conditions:  Vec<Expression>,
    /// The block evaluated when the arm fires.
    pub consequence: BlockStatement,
}

/// The `catch` part of a `try` expression.
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Name the caught error is bound to.
    pub name: Option<String>,
    /// Handler block.
    pub body: BlockStatement,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// `-x`
    Neg,
    /// `!x`
    Bang,
    /// `not x`
    Not,
    /// `~x`
    BitNot,
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    /// `or`
    Or,
    /// `and`
    And,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `in`
    In,
    /// `notin`
    NotIn,
    /// `..`
    Range,
    /// `..<`
    RangeExclusive,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

impl InfixOperator {
    /// Maps an operator token to its infix operator.
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
                 TokenKind::Or => Self::Or,
                 TokenKind::And => Self::And,
                 TokenKind::Eq => Self::Eq,
                 TokenKind::NotEq => Self::NotEq,
                 TokenKind::Lt => Self::Lt,
                 TokenKind::LtEq => Self::LtEq,
                 TokenKind::Gt => Self::Gt,
                 TokenKind::GtEq => Self::GtEq,
                 TokenKind::In => Self::In,
                 TokenKind::NotIn => Self::NotIn,
                 TokenKind::DotDot => Self::Range,
                 TokenKind::DotDotLt => Self::RangeExclusive,
                 TokenKind::Pipe => Self::BitOr,
                 TokenKind::Caret => Self::BitXor,
                 TokenKind::Amp => Self::BitAnd,
                 TokenKind::Shl => Self::Shl,
                 TokenKind::Shr => Self::Shr,
                 TokenKind::Plus => Self::Add,
                 TokenKind::Minus => Self::Sub,
                 TokenKind::Star => Self::Mul,
                 TokenKind::Slash => Self::Div,
                 TokenKind::FloorDiv => Self::FloorDiv,
                 TokenKind::Percent => Self::Mod,
                 TokenKind::Pow => Self::Pow,
                 _ => return None,
             })
    }

    /// The surface symbol of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Range => "..",
            Self::RangeExclusive => "..<",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

/// `=` or a compound assignment such as `+=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    /// Plain `=`.
    Assign,
    /// `op=`: the new value is `current op value`.
    Compound(InfixOperator),
}

impl AssignOperator {
    /// Maps an assignment token to its operator.
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Assign => return Some(Self::Assign),
            TokenKind::PlusAssign => InfixOperator::Add,
            TokenKind::MinusAssign => InfixOperator::Sub,
            TokenKind::StarAssign => InfixOperator::Mul,
            TokenKind::SlashAssign => InfixOperator::Div,
            TokenKind::FloorDivAssign => InfixOperator::FloorDiv,
            TokenKind::PercentAssign => InfixOperator::Mod,
            TokenKind::PowAssign => InfixOperator::Pow,
            TokenKind::AmpAssign => InfixOperator::BitAnd,
            TokenKind::PipeAssign => InfixOperator::BitOr,
            TokenKind::CaretAssign => InfixOperator::BitXor,
            TokenKind::ShrAssign => InfixOperator::Shr,
            TokenKind::ShlAssign => InfixOperator::Shl,
            _ => return None,
        };
        Some(Self::Compound(op))
    }
}

/// Statement nodes. Each carries the token it started at.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `var name = value` or `var name op= value`.
    Var {
        /// The `var` token.
        token:    Token,
        /// Bound name.
        name:     String,
        /// `=` or a compound operator.
        operator: AssignOperator,
        /// Right-hand side.
        value:    Expression,
    },
    /// `val name = value` (also spelled `const`).
    Val {
        /// The `val`/`const` token.
        token: Token,
        /// Bound name.
        name:  String,
        /// Right-hand side.
        value: Expression,
    },
    /// `fun name(params) { body }`.
    Function {
        /// The `fun` token.
        token:    Token,
        /// The named literal.
        function: Arc<FunctionLiteral>,
    },
    /// `return [value]`.
    Return {
        /// The `return` token.
        token: Token,
        /// Returned expression; `null` when absent.
        value: Option<Expression>,
    },
    /// `break`.
    Break {
        /// The `break` token.
        token: Token,
    },
    /// `continue`.
    Continue {
        /// The `continue` token.
        token: Token,
    },
    /// A bare expression.
    Expression {
        /// First token of the expression.
        token:      Token,
        /// The expression.
        expression: Expression,
    },
    /// A nested `{ ... }` block.
    Block(BlockStatement),
    /// `import a.b.c`.
    Import {
        /// The `import` token.
        token: Token,
        /// The dotted path.
        path:  String,
    },
}

impl Statement {
    /// The token the statement started at.
    #[must_use]
    pub const fn token(&self) -> &Token {
        match self {
            Self::Var { token, .. }
            | Self::Val { token, .. }
            | Self::Function { token, .. }
            | Self::Return { token, .. }
            | Self::Break { token }
            | Self::Continue { token }
            | Self::Expression { token, .. }
            | Self::Import { token, .. } => token,
            Self::Block(block) => &block.token,
        }
    }
}

/// Expression nodes. Each carries the token it started at (for infix forms,
/// the operator token).
#[derive(Debug, Clone)]
pub enum Expression {
    /// A name.
    Identifier {
        /// The identifier token.
        token: Token,
        /// The name.
        name:  String,
    },
    /// `null`
    Null {
        /// The `null` token.
        token: Token,
    },
    /// `true` / `false`
    Boolean {
        /// The keyword token.
        token: Token,
        /// The value.
        value: bool,
    },
    /// Decimal integer literal that fits in 64 bits.
    Integer {
        /// The literal token.
        token: Token,
        /// The value.
        value: i64,
    },
    /// Integer literal too large for 64 bits.
    BigInteger {
        /// The literal token.
        token: Token,
        /// The value.
        value: Arc<BigInt>,
    },
    /// Float literal.
    Float {
        /// The literal token.
        token: Token,
        /// The value.
        value: f64,
    },
    /// Float literal outside the `f64` range.
    BigFloat {
        /// The literal token.
        token: Token,
        /// The value.
        value: Arc<BigDecimal>,
    },
    /// `0x..` literal.
    Hex {
        /// The literal token.
        token: Token,
        /// The value.
        value: u64,
    },
    /// `0o..` literal.
    Octal {
        /// The literal token.
        token: Token,
        /// The value.
        value: u64,
    },
    /// `0b..` literal.
    Binary {
        /// The literal token.
        token: Token,
        /// The value.
        value: u64,
    },
    /// `0u..` literal.
    UInteger {
        /// The literal token.
        token: Token,
        /// The value.
        value: u64,
    },
    /// A string literal, possibly interpolated. The token literal holds the
    /// processed text.
    String {
        /// The string token.
        token: Token,
        /// Text and interpolation parts, in order.
        parts: Vec<StringPart>,
    },
    /// `` `command` ``
    ExecString {
        /// The exec-string token.
        token:   Token,
        /// The command text.
        command: String,
    },
    /// `r/pattern/`, compiled while parsing.
    Regex {
        /// The regex token.
        token:   Token,
        /// The compiled pattern.
        pattern: Arc<Regex>,
    },
    /// `[a, b, c]`
    List {
        /// The `[` token.
        token:    Token,
        /// Elements in order.
        elements: Vec<Expression>,
    },
    /// `[e for x in xs if c]`
    ListComp {
        /// The `[` token.
        token:   Token,
        /// Element expression.
        element: Box<Expression>,
        /// Iteration clause.
        clause:  Box<ComprehensionClause>,
    },
    /// `{k: v, ...}`
    Map {
        /// The `{` token.
        token:   Token,
        /// Key/value pairs in insertion order.
        entries: Vec<(Expression, Expression)>,
    },
    /// `{k: v for ...}`
    MapComp {
        /// The `{` token.
        token:  Token,
        /// Key expression.
        key:    Box<Expression>,
        /// Value expression.
        value:  Box<Expression>,
        /// Iteration clause.
        clause: Box<ComprehensionClause>,
    },
    /// `{a, b}`
    Set {
        /// The `{` token.
        token:    Token,
        /// Elements in order.
        elements: Vec<Expression>,
    },
    /// `{e for ...}`
    SetComp {
        /// The `{` token.
        token:   Token,
        /// Element expression.
        element: Box<Expression>,
        /// Iteration clause.
        clause:  Box<ComprehensionClause>,
    },
    /// `{name: value, ...}` where every key is a bare identifier.
    Struct {
        /// The `{` token.
        token:  Token,
        /// Fields in order.
        fields: Vec<(String, Expression)>,
    },
    /// `fun(params) { body }`
    Function(Arc<FunctionLiteral>),
    /// `op right`
    Prefix {
        /// The operator token.
        token:    Token,
        /// The operator.
        operator: PrefixOperator,
        /// Operand.
        right:    Box<Expression>,
    },
    /// `left op right`
    Infix {
        /// The operator token.
        token:    Token,
        /// Left operand.
        left:     Box<Expression>,
        /// The operator.
        operator: InfixOperator,
        /// Right operand.
        right:    Box<Expression>,
    },
    /// `if cond { } else { }`; `else if` chains nest inside the alternative.
    If {
        /// The `if` token.
        token:       Token,
        /// Condition.
        condition:   Box<Expression>,
        /// Block evaluated when the condition is truthy.
        consequence: BlockStatement,
        /// Optional else block.
        alternative: Option<BlockStatement>,
    },
    /// `match [subject] { arms }`
    Match {
        /// The `match` token.
        token:   Token,
        /// Optional discriminant.
        subject: Option<Box<Expression>>,
        /// Arms in order.
        arms:    Vec<MatchArm>,
    },
    /// `callee(args, name = value)`
    Call {
        /// The `(` token.
        token:     Token,
        /// Callee expression.
        function:  Box<Expression>,
        /// Positional arguments.
        arguments: Vec<Expression>,
        /// Named arguments in source order.
        named:     Vec<(String, Expression)>,
    },
    /// `left[index]`; also the desugaring of `left.name`.
    Index {
        /// The `[` or `.` token.
        token: Token,
        /// Indexed expression.
        left:  Box<Expression>,
        /// Index expression.
        index: Box<Expression>,
    },
    /// `for condition { body }`
    For {
        /// The `for` token.
        token:     Token,
        /// Loop condition.
        condition: Box<Expression>,
        /// Loop body.
        body:      BlockStatement,
    },
    /// `for x[, y] in iterable { body }`
    ForIn {
        /// The `for` token.
        token:    Token,
        /// One or two loop bindings.
        bindings: Vec<String>,
        /// The collection iterated over.
        iterable: Box<Expression>,
        /// Loop body.
        body:     BlockStatement,
    },
    /// `target op= value`
    Assign {
        /// The assignment operator token.
        token:    Token,
        /// An identifier or index expression.
        target:   Box<Expression>,
        /// `=` or a compound operator.
        operator: AssignOperator,
        /// Right-hand side.
        value:    Box<Expression>,
    },
    /// `eval(source)`
    Eval {
        /// The `eval` token.
        token:  Token,
        /// Expression producing the source string.
        source: Box<Expression>,
    },
    /// `try { } catch (e) { } finally { }`
    Try {
        /// The `try` token.
        token:   Token,
        /// Protected block.
        body:    BlockStatement,
        /// Optional handler.
        catch:   Option<CatchClause>,
        /// Optional block that always runs.
        finally: Option<BlockStatement>,
    },
}

impl Expression {
    /// The token the expression is attributed to.
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Function(function) => &function.token,
            Self::Identifier { token, .. }
            | Self::Null { token }
            | Self::Boolean { token, .. }
            | Self::Integer { token, .. }
            | Self::BigInteger { token, .. }
            | Self::Float { token, .. }
            | Self::BigFloat { token, .. }
            | Self::Hex { token, .. }
            | Self::Octal { token, .. }
            | Self::Binary { token, .. }
            | Self::UInteger { token, .. }
            | Self::String { token, .. }
            | Self::ExecString { token, .. }
            | Self::Regex { token, .. }
            | Self::List { token, .. }
            | Self::ListComp { token, .. }
            | Self::Map { token, .. }
            | Self::MapComp { token, .. }
            | Self::Set { token, .. }
            | Self::SetComp { token, .. }
            | Self::Struct { token, .. }
            | Self::Prefix { token, .. }
            | Self::Infix { token, .. }
            | Self::If { token, .. }
            | Self::Match { token, .. }
            | Self::Call { token, .. }
            | Self::Index { token, .. }
            | Self::For { token, .. }
            | Self::ForIn { token, .. }
            | Self::Assign { token, .. }
            | Self::Eval { token, .. }
            | Self::Try { token, .. } => token,
        }
    }

    /// Returns `true` for the `_` wildcard used in match arms.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Identifier { name, .. } if name == "_")
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::Neg => "-",
                        Self::Bang => "!",
                        Self::Not => "not ",
                        Self::BitNot => "~",
                    })
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for AssignOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign => f.write_str("="),
            Self::Compound(op) => write!(f, "{op}="),
        }
    }
}

/// Writes `items` separated by `", "`.
fn comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Re-escapes processed string text so it lexes back to the same text.
fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
            },
            c => out.push(c),
        }
    }
    out
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{statement}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{} = {default}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fun")?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        f.write_str("(")?;
        comma_separated(f, &self.parameters)?;
        write!(f, ") {}", self.body)
    }
}

impl fmt::Display for ComprehensionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "for {} in {}", self.bindings.join(", "), self.iterable)?;
        if let Some(filter) = &self.filter {
            write!(f, " if {filter}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var { name,
                        operator,
                        value,
                        .. } => write!(f, "var {name} {operator} {value}"),
            Self::Val { name, value, .. } => write!(f, "val {name} = {value}"),
            Self::Function { function, .. } => write!(f, "{function}"),
            Self::Return { value: Some(value),
                           .. } => write!(f, "return {value}"),
            Self::Return { value: None, .. } => f.write_str("return"),
            Self::Break { .. } => f.write_str("break"),
            Self::Continue { .. } => f.write_str("continue"),
            // A leading `{` would re-parse as a block.
            Self::Expression { expression:
                                   expression @ (Expression::Map { .. }
                                   | Expression::MapComp { .. }
                                   | Expression::Set { .. }
                                   | Expression::SetComp { .. }
                                   | Expression::Struct { .. }),
                               .. } => write!(f, "({expression})"),
            Self::Expression { expression, .. } => write!(f, "{expression}"),
            Self::Block(block) => write!(f, "{block}"),
            Self::Import { path, .. } => write!(f, "import {path}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier { name, .. } => f.write_str(name),
            Self::Null { .. } => f.write_str("null"),
            Self::Boolean { value, .. } => write!(f, "{value}"),
            Self::Integer { token, .. }
            | Self::BigInteger { token, .. }
            | Self::Float { token, .. }
            | Self::BigFloat { token, .. }
            | Self::Hex { token, .. }
            | Self::Octal { token, .. }
            | Self::Binary { token, .. }
            | Self::UInteger { token, .. } => f.write_str(&token.literal),
            Self::String { token, .. } if token.kind == TokenKind::RawString => {
                write!(f, "\"\"\"{}\"\"\"", token.literal)
            },
            Self::String { token, .. } => write!(f, "\"{}\"", escape_string(&token.literal)),
            Self::ExecString { command, .. } => write!(f, "`{command}`"),
            Self::Regex { pattern, .. } => write!(f, "r/{}/", pattern.as_str()),
            Self::List { elements, .. } => {
                f.write_str("[")?;
                comma_separated(f, elements)?;
                f.write_str("]")
            },
            Self::ListComp { element, clause, .. } => write!(f, "[{element} {clause}]"),
            Self::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            },
            Self::MapComp { key,
                            value,
                            clause,
                            .. } => write!(f, "{{{key}: {value} {clause}}}"),
            Self::Set { elements, .. } => {
                f.write_str("{")?;
                comma_separated(f, elements)?;
                f.write_str("}")
            },
            Self::SetComp { element, clause, .. } => write!(f, "{{{element} {clause}}}"),
            Self::Struct { fields, .. } => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            },
            Self::Function(function) => write!(f, "{function}"),
            Self::Prefix { operator, right, .. } => write!(f, "({operator}{right})"),
            Self::Infix { left,
                          operator,
                          right,
                          .. } => write!(f, "({left} {operator} {right})"),
            Self::If { condition,
                       consequence,
                       alternative,
                       .. } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alternative) = alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            },
            Self::Match { subject, arms, .. } => {
                f.write_str("match ")?;
                if let Some(subject) = subject {
                    write!(f, "{subject} ")?;
                }
                f.write_str("{")?;
                for arm in arms {
                    f.write_str(" ")?;
                    comma_separated(f, &arm.conditions)?;
                    write!(f, " => {}", arm.consequence)?;
                }
                f.write_str(" }")
            },
            Self::Call { function,
                         arguments,
                         named,
                         .. } => {
                write!(f, "{function}(")?;
                comma_separated(f, arguments)?;
                for (i, (name, value)) in named.iter().enumerate() {
                    if i > 0 || !arguments.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                f.write_str(")")
            },
            Self::Index { left, index, .. } => write!(f, "({left}[{index}])"),
            Self::For { condition, body, .. } => write!(f, "for {condition} {body}"),
            Self::ForIn { bindings,
                          iterable,
                          body,
                          .. } => write!(f, "for {} in {iterable} {body}", bindings.join(", ")),
            Self::Assign { target,
                           operator,
                           value,
                           .. } => write!(f, "({target} {operator} {value})"),
            Self::Eval { source, .. } => write!(f, "eval({source})"),
            Self::Try { body,
                        catch,
                        finally,
                        .. } => {
                write!(f, "try {body}")?;
                if let Some(catch) = catch {
                    match &catch.name {
                        Some(name) => write!(f, " catch ({name}) {}", catch.body)?,
                        None => write!(f, " catch {}", catch.body)?,
                    }
                }
                if let Some(finally) = finally {
                    write!(f, " finally {finally}")?;
                }
                Ok(())
            },
        }
    }
}
