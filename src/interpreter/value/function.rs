use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    ast::FunctionLiteral,
    error::RuntimeError,
    interpreter::{
        environment::{ArenaId, FrameId},
        evaluator::core::{EvalResult, Evaluator},
        token::Position,
        value::core::Value,
    },
};

/// A user-defined function: the shared literal plus the frame it closes
/// over.
#[derive(Debug)]
pub struct Function {
    /// Parameters and body.
    pub literal: Arc<FunctionLiteral>,
    /// Frame the function was created in.
    pub env:     FrameId,
    /// Arena `env` belongs to.
    pub arena:   ArenaId,
}

/// Host callable signature.
///
/// Builtins receive the calling evaluator, so they can invoke user callables
/// (`sort` with a key, `spawn`) and reach the host capabilities.
pub type BuiltinFn = Arc<dyn Fn(&mut Evaluator, Arguments) -> EvalResult<Value> + Send + Sync>;

/// Specifies the allowed number of positional arguments for a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive.
    Range(usize, usize),
    /// At least `n` arguments.
    AtLeast(usize),
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::value::function::Arity;
    ///
    /// assert!(Arity::Range(1, 2).check(2));
    /// assert!(!Arity::Exact(1).check(0));
    /// assert!(Arity::AtLeast(0).check(7));
    /// ```
    #[must_use]
    pub const fn check(self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == m,
            Self::Range(min, max) => min <= n && n <= max,
            Self::AtLeast(min) => n >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(1) => f.write_str("1 argument"),
            Self::Exact(n) => write!(f, "{n} arguments"),
            Self::Range(min, max) => write!(f, "{min} to {max} arguments"),
            Self::AtLeast(n) => write!(f, "at least {n} arguments"),
        }
    }
}

/// A host-provided callable.
pub struct Builtin {
    /// Registered name.
    pub name:          String,
    /// Accepted positional argument counts.
    pub arity:         Arity,
    /// Text shown by `help`.
    pub help:          String,
    /// Whether the builtin mutates its first argument in place.
    pub mutates:       bool,
    /// Whether named arguments are forwarded instead of rejected.
    pub accepts_named: bool,
    /// The implementation.
    pub func:          BuiltinFn,
}

impl Builtin {
    /// Creates a builtin that takes positional arguments only and does not
    /// mutate them.
    pub fn new<F>(name: impl Into<String>, arity: Arity, help: impl Into<String>, func: F) -> Self
        where F: Fn(&mut Evaluator, Arguments) -> EvalResult<Value> + Send + Sync + 'static
    {
        Self { name: name.into(),
               arity,
               help: help.into(),
               mutates: false,
               accepts_named: false,
               func: Arc::new(func) }
    }

    /// Marks the builtin as mutating its first argument.
    #[must_use]
    pub const fn mutating(mut self) -> Self {
        self.mutates = true;
        self
    }

    /// Lets the builtin receive named arguments.
    #[must_use]
    pub const fn with_named(mut self) -> Self {
        self.accepts_named = true;
        self
    }

    /// Checks the argument shape and runs the builtin.
    ///
    /// # Errors
    /// Returns an `ArityError` for a positional count outside
    /// [`arity`](Self::arity), a `TypeError` for named arguments the builtin
    /// does not accept, and whatever the builtin itself reports.
    pub fn call(&self, evaluator: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
        if !self.arity.check(args.positional.len()) {
            return Err(RuntimeError::arity(format!("{}() takes {}, got {}",
                                                   self.name,
                                                   self.arity,
                                                   args.positional.len())));
        }
        if !self.accepts_named && let Some((name, _)) = args.named.first() {
            return Err(RuntimeError::type_error(format!("{}() got an unexpected named argument '{name}'",
                                                        self.name)));
        }
        (self.func)(evaluator, args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
         .field("name", &self.name)
         .field("arity", &self.arity)
         .field("mutates", &self.mutates)
         .field("accepts_named", &self.accepts_named)
         .finish_non_exhaustive()
    }
}

/// A namespace of values with help text, such as `math` or `proc`.
#[derive(Debug)]
pub struct BuiltinObj {
    /// Namespace name.
    pub name:    String,
    /// Text shown by `help`.
    pub help:    String,
    /// Members reachable with `.` or indexing.
    pub members: IndexMap<String, Value>,
}

/// The result of an `import`: a module's top-level frame.
#[derive(Debug)]
pub struct Module {
    /// Name the module is bound under (the last path segment).
    pub name:  String,
    /// The module's top-level frame.
    pub env:   FrameId,
    /// Arena `env` belongs to.
    pub arena: ArenaId,
}

/// Evaluated arguments of a builtin call.
#[derive(Debug, Clone)]
pub struct Arguments {
    /// Positional arguments in order.
    pub positional: Vec<Value>,
    /// Named arguments in source order.
    pub named:      Vec<(String, Value)>,
    /// Position of the call.
    pub position:   Position,
}

impl Arguments {
    /// Positional-only arguments.
    #[must_use]
    pub const fn new(positional: Vec<Value>, position: Position) -> Self {
        Self { positional,
               named: Vec::new(),
               position }
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Returns `true` if there are no positional arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    /// The positional argument at `index`, if supplied.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// The positional argument at `index`.
    ///
    /// # Errors
    /// Returns an `ArityError` if it was not supplied.
    pub fn at(&self, index: usize) -> EvalResult<&Value> {
        self.positional
            .get(index)
            .ok_or_else(|| RuntimeError::arity(format!("missing argument {}", index + 1)))
    }

    /// The named argument `name`, if supplied.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
