use std::{fmt, sync::Arc};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use regex::Regex;

use crate::{
    error::RuntimeError,
    interpreter::{
        broker::Subscriber,
        evaluator::core::EvalResult,
        process::Process,
        value::{
            collection::{MapValue, SetValue},
            function::{Builtin, BuiltinObj, Function, Module},
            numeric::{Number, normalize, numeric_eq},
            shared::Shared,
        },
    },
};

/// Collections nested deeper than this print as `...`.
const INSPECT_DEPTH: usize = 64;

/// Represents a runtime value in the interpreter.
///
/// Scalars are stored inline or behind an `Arc`; lists, maps and sets are
/// [`Shared`] so that every holder sees in-place mutation. `Return`, `Break`
/// and `Continue` never escape a function or loop: they only unwind block
/// execution.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// Arbitrary-precision integer, only for values outside the `i64` range.
    BigInteger(Arc<BigInt>),
    /// 64-bit unsigned integer.
    UInteger(u64),
    /// 64-bit IEEE float.
    Float(f64),
    /// Arbitrary-precision decimal.
    BigFloat(Arc<BigDecimal>),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// UTF-8 text.
    String(Arc<str>),
    /// A byte sequence.
    Bytes(Arc<[u8]>),
    /// A compiled regular expression.
    Regex(Arc<Regex>),
    /// Ordered, mutable sequence.
    List(Shared<Vec<Self>>),
    /// Insertion-ordered, mutable map.
    Map(Shared<MapValue>),
    /// Insertion-ordered, mutable set.
    Set(Shared<SetValue>),
    /// A closure.
    Function(Arc<Function>),
    /// A host callable.
    Builtin(Arc<Builtin>),
    /// A namespace of builtins and constants.
    BuiltinObj(Arc<BuiltinObj>),
    /// An imported module.
    Module(Arc<Module>),
    /// A handle to a running (or finished) process.
    Process(Arc<Process>),
    /// A broker subscription.
    Subscriber(Arc<Subscriber>),
    /// A caught evaluation failure.
    Error(Arc<RuntimeError>),
    /// Unwinds to the enclosing function call.
    Return(Box<Self>),
    /// Unwinds to the enclosing loop and exits it.
    Break,
    /// Unwinds to the enclosing loop and starts the next iteration.
    Continue,
}

/// The canonical `true`.
pub const TRUE: Value = Value::Boolean(true);
/// The canonical `false`.
pub const FALSE: Value = Value::Boolean(false);
/// The canonical `null`.
pub const NULL: Value = Value::Null;

/// A stable tag per value variant, as reported by `type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    BigInteger,
    UInteger,
    Float,
    BigFloat,
    Boolean,
    Null,
    String,
    Bytes,
    Regex,
    List,
    Map,
    Set,
    Function,
    Builtin,
    BuiltinObj,
    Module,
    Process,
    Subscriber,
    Error,
    Return,
    Break,
    Continue,
}

impl TypeTag {
    /// The upper-case name used in messages and by `type()`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::BigInteger => "BIG_INTEGER",
            Self::UInteger => "UINTEGER",
            Self::Float => "FLOAT",
            Self::BigFloat => "BIG_FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Null => "NULL",
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::Regex => "REGEX",
            Self::List => "LIST",
            Self::Map => "MAP",
            Self::Set => "SET",
            Self::Function => "FUNCTION",
            Self::Builtin => "BUILTIN",
            Self::BuiltinObj => "BUILTIN_OBJ",
            Self::Module => "MODULE",
            Self::Process => "PROCESS",
            Self::Subscriber => "SUBSCRIBER",
            Self::Error => "ERROR",
            Self::Return => "RETURN",
            Self::Break => "BREAK",
            Self::Continue => "CONTINUE",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInteger(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        normalize(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(Shared::new(v))
    }
}

impl From<MapValue> for Value {
    fn from(v: MapValue) -> Self {
        Self::Map(Shared::new(v))
    }
}

impl From<SetValue> for Value {
    fn from(v: SetValue) -> Self {
        Self::Set(Shared::new(v))
    }
}

impl From<RuntimeError> for Value {
    fn from(v: RuntimeError) -> Self {
        Self::Error(Arc::new(v))
    }
}

impl Value {
    /// The type tag of this value.
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        match self {
            Self::Integer(_) => TypeTag::Integer,
            Self::BigInteger(_) => TypeTag::BigInteger,
            Self::UInteger(_) => TypeTag::UInteger,
            Self::Float(_) => TypeTag::Float,
            Self::BigFloat(_) => TypeTag::BigFloat,
            Self::Boolean(_) => TypeTag::Boolean,
            Self::Null => TypeTag::Null,
            Self::String(_) => TypeTag::String,
            Self::Bytes(_) => TypeTag::Bytes,
            Self::Regex(_) => TypeTag::Regex,
            Self::List(_) => TypeTag::List,
            Self::Map(_) => TypeTag::Map,
            Self::Set(_) => TypeTag::Set,
            Self::Function(_) => TypeTag::Function,
            Self::Builtin(_) => TypeTag::Builtin,
            Self::BuiltinObj(_) => TypeTag::BuiltinObj,
            Self::Module(_) => TypeTag::Module,
            Self::Process(_) => TypeTag::Process,
            Self::Subscriber(_) => TypeTag::Subscriber,
            Self::Error(_) => TypeTag::Error,
            Self::Return(_) => TypeTag::Return,
            Self::Break => TypeTag::Break,
            Self::Continue => TypeTag::Continue,
        }
    }

    /// Shorthand for `self.type_tag().name()`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// Applies the truthiness rule: `null`, `false` and empty collections
    /// are false, everything else is true.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::value::core::{NULL, Value};
    ///
    /// assert!(!NULL.is_truthy());
    /// assert!(!Value::from(Vec::new()).is_truthy());
    /// assert!(Value::Integer(0).is_truthy());
    /// ```
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::List(items) => !items.read().is_empty(),
            Self::Map(map) => !map.read().is_empty(),
            Self::Set(set) => !set.read().is_empty(),
            _ => true,
        }
    }

    /// Returns `true` for the `Return`, `Break` and `Continue` markers.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Return(_) | Self::Break | Self::Continue)
    }

    /// Returns `true` for every numeric variant.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self,
                 Self::Integer(_)
                 | Self::BigInteger(_)
                 | Self::UInteger(_)
                 | Self::Float(_)
                 | Self::BigFloat(_))
    }

    /// The printable form of the value. Strings print without quotes.
    #[must_use]
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    /// The value as an `i64`, for integers that fit.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::UInteger(u) => i64::try_from(*u).ok(),
            Self::BigInteger(b) => i64::try_from(&**b).ok(),
            _ => None,
        }
    }

    /// The text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an `i64`, or a `TypeError` naming `what` was expected.
    ///
    /// # Errors
    /// Returns a `TypeError` for non-integers and a `RangeError` for integers
    /// outside the `i64` range.
    pub fn expect_i64(&self, what: &str) -> EvalResult<i64> {
        match self {
            Self::Integer(_) | Self::UInteger(_) | Self::BigInteger(_) => {
                self.as_i64()
                    .ok_or_else(|| RuntimeError::range(format!("{what} is out of range: {self}")))
            },
            other => Err(RuntimeError::type_error(format!("{what} must be an integer, got {}",
                                                          other.type_name()))),
        }
    }

    /// The text of a string value, or a `TypeError` naming `what` was
    /// expected.
    ///
    /// # Errors
    /// Returns a `TypeError` for non-strings.
    pub fn expect_str(&self, what: &str) -> EvalResult<&str> {
        self.as_str().ok_or_else(|| {
                         RuntimeError::type_error(format!("{what} must be a STRING, got {}",
                                                          self.type_name()))
                     })
    }

    /// Structural equality.
    ///
    /// Numbers compare by exact value across kinds, collections compare
    /// element-wise (maps and sets ignore order), functions compare by their
    /// source text and handles by identity. Values of unrelated types are
    /// never equal.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::value::core::Value;
    ///
    /// assert!(Value::Integer(2).equals(&Value::Float(2.0)));
    /// assert!(Value::from(vec![Value::Integer(1)]).equals(&Value::from(vec![Value::UInteger(1)])));
    /// assert!(!Value::from("1").equals(&Value::Integer(1)));
    /// ```
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (Number::from_value(self), Number::from_value(other)) {
            return numeric_eq(&a, &b);
        }

        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Break, Self::Break) | (Self::Continue, Self::Continue) => {
                true
            },
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            (Self::List(a), Self::List(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.snapshot(), b.snapshot());
                a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.equals(y))
            },
            (Self::Map(a), Self::Map(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.snapshot(), b.snapshot());
                a.len() == b.len()
                && a.iter().all(|(k, v)| {
                                matches!(b.get(k), Ok(Some(other)) if other.equals(v))
                            })
            },
            (Self::Set(a), Self::Set(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.is_subset(&b)
            },
            (Self::Function(a), Self::Function(b)) => {
                Arc::ptr_eq(&a.literal, &b.literal) || a.literal.to_string() == b.literal.to_string()
            },
            (Self::Builtin(a), Self::Builtin(b)) => Arc::ptr_eq(a, b),
            (Self::BuiltinObj(a), Self::BuiltinObj(b)) => Arc::ptr_eq(a, b),
            (Self::Module(a), Self::Module(b)) => Arc::ptr_eq(a, b),
            (Self::Process(a), Self::Process(b)) => a.key() == b.key(),
            (Self::Subscriber(a), Self::Subscriber(b)) => a.id() == b.id(),
            (Self::Error(a), Self::Error(b)) => a.kind == b.kind && a.message == b.message,
            (Self::Return(a), Self::Return(b)) => a.equals(b),
            _ => false,
        }
    }

    fn write_inspect(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > INSPECT_DEPTH {
            return f.write_str("...");
        }

        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::BigInteger(b) => write!(f, "{b}"),
            Self::UInteger(u) => write!(f, "{u}"),
            Self::Float(x) => write_float(f, *x),
            Self::BigFloat(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::String(s) => f.write_str(s),
            Self::Bytes(bytes) => write_bytes(f, bytes),
            Self::Regex(r) => write!(f, "r/{}/", r.as_str()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_inspect(f, depth + 1)?;
                }
                f.write_str("]")
            },
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.read().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_inspect(f, depth + 1)?;
                    f.write_str(": ")?;
                    value.write_inspect(f, depth + 1)?;
                }
                f.write_str("}")
            },
            Self::Set(set) => {
                let set = set.read();
                if set.is_empty() {
                    return f.write_str("set()");
                }
                f.write_str("{")?;
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_inspect(f, depth + 1)?;
                }
                f.write_str("}")
            },
            Self::Function(function) => write!(f, "{}", function.literal),
            Self::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Self::BuiltinObj(obj) => write!(f, "<builtin_obj {}>", obj.name),
            Self::Module(module) => write!(f, "<module {}>", module.name),
            Self::Process(process) => write!(f, "<process {}:{}>", process.node(), process.id()),
            Self::Subscriber(subscriber) => write!(f, "<subscriber {}>", subscriber.id()),
            Self::Error(e) => write!(f, "{e}"),
            Self::Return(value) => value.write_inspect(f, depth),
            Self::Break => f.write_str("break"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_inspect(f, 0)
    }
}

/// Integral floats keep a `.0` so they read back as floats; very large or
/// small magnitudes use exponent notation.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if !x.is_finite() {
        return write!(f, "{x}");
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-5..1e16).contains(&magnitude) {
        return write!(f, "{x:e}");
    }
    if x.fract() == 0.0 { write!(f, "{x:.1}") } else { write!(f, "{x}") }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for &byte in bytes {
        match byte {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            0x20..=0x7e => write!(f, "{}", char::from(byte))?,
            _ => write!(f, "\\x{byte:02x}")?,
        }
    }
    f.write_str("\"")
}
