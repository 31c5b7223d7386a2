use std::fmt;

use crate::interpreter::token::Position;

/// The error taxonomy. Each kind renders as the fixed prefix of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Scanning failed (only surfaced through `eval` and imports).
    Lex,
    /// Parsing failed (only surfaced through `eval` and imports).
    Parser,
    /// Unknown identifier or assignment to an immutable binding.
    Name,
    /// Operator/type mismatch, non-hashable key, non-indexable target.
    Type,
    /// Wrong number of arguments or a missing required parameter.
    Arity,
    /// Index out of bounds.
    Range,
    /// Division or modulus by zero, and other numeric domain failures.
    Arithmetic,
    /// Mailbox closed or timed out.
    Process,
    /// Module could not be loaded, or imports form a cycle.
    Import,
    /// Reported by a host builtin.
    Host,
    /// `return` outside a function, `break`/`continue` outside a loop.
    ControlFlow,
}

impl ErrorKind {
    /// The prefix used when rendering errors of this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Lex => "LexError",
            Self::Parser => "ParserError",
            Self::Name => "NameError",
            Self::Type => "TypeError",
            Self::Arity => "ArityError",
            Self::Range => "RangeError",
            Self::Arithmetic => "ArithmeticError",
            Self::Process => "ProcessError",
            Self::Import => "ImportError",
            Self::Host => "HostError",
            Self::ControlFlow => "ControlFlowError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// An evaluation failure.
///
/// Runtime errors travel through the evaluator as the `Err` side of
/// `EvalResult`; `try`/`catch` and the top-level driver turn them into
/// `Error` values. The trace holds the innermost source positions that were
/// being evaluated when the error was raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    /// Which class of failure this is.
    pub kind:    ErrorKind,
    /// Human readable description, without the kind prefix.
    pub message: String,
    /// Innermost-first positions captured when the error was raised.
    pub trace:   Vec<Position>,
}

impl RuntimeError {
    /// Creates an error of the given kind with an empty trace.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind,
               message: message.into(),
               trace: Vec::new() }
    }

    /// Creates a `NameError`.
    #[must_use]
    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    /// Creates a `TypeError`.
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    /// Creates an `ArityError`.
    #[must_use]
    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    /// Creates a `RangeError`.
    #[must_use]
    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    /// Creates an `ArithmeticError`.
    #[must_use]
    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arithmetic, message)
    }

    /// Creates a `ProcessError`.
    #[must_use]
    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Process, message)
    }

    /// Creates an `ImportError`.
    #[must_use]
    pub fn import(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Import, message)
    }

    /// Creates a `HostError`.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, message)
    }

    /// Creates a `ControlFlowError`.
    #[must_use]
    pub fn control_flow(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ControlFlow, message)
    }

    /// The standard "unknown operator: T1 OP T2" type error.
    #[must_use]
    pub fn unknown_operator(left: impl fmt::Display,
                            op: impl fmt::Display,
                            right: impl fmt::Display)
                            -> Self {
        Self::type_error(format!("unknown operator: {left} {op} {right}"))
    }

    /// The standard divide-by-zero arithmetic error.
    #[must_use]
    pub fn division_by_zero() -> Self {
        Self::arithmetic("division by zero")
    }

    /// Returns `true` if the error has no trace attached yet.
    #[must_use]
    pub const fn is_untraced(&self) -> bool {
        self.trace.is_empty()
    }
}
