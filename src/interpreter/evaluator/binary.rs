/// Operator dispatch.
///
/// Evaluates both operands and routes the operation by operand types.
pub mod core;

/// Arithmetic on the numeric tower.
pub mod arithmetic;

/// Ordering comparisons on numbers and strings.
pub mod comparison;

/// Bitwise operators on byte strings.
pub mod bitwise;

/// Set algebra and subset comparisons.
pub mod set;

/// String, list and map operators, membership and ranges.
pub mod sequence;

/// Short-circuit `and` and `or`.
pub mod logic;
