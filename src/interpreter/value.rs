/// The value universe.
///
/// Defines the `Value` enum with its type tags, truthiness, printing and
/// structural equality, plus the canonical `TRUE`, `FALSE` and `NULL`.
pub mod core;
/// Numeric tower.
///
/// Promotion of mixed numeric operands to a common domain, and the
/// arithmetic, comparison and bitwise rules carried out there. Integer
/// overflow widens to big integers instead of wrapping.
pub mod numeric;
/// Hash keys.
///
/// Computes the keys maps and sets are indexed by, consistent with
/// structural equality across numeric kinds.
pub mod hash;
/// Ordered collections.
///
/// The insertion-ordered map and set stores behind `Value::Map` and
/// `Value::Set`.
pub mod collection;
/// Callables.
///
/// Closures, host builtins with their arity and help metadata, namespaces,
/// modules and builtin call arguments.
pub mod function;
/// Shared mutable cells.
pub mod shared;

pub use self::core::{FALSE, NULL, TRUE, TypeTag, Value};
