/// Core evaluation logic and evaluator state.
///
/// Contains the [`Evaluator`](core::Evaluator) itself, statement and block
/// execution, expression dispatch and the propagation of `return`, `break`
/// and `continue` markers.
pub mod core;

/// Error traces and source text for diagnostics.
///
/// Keeps the bounded stack of positions being evaluated and the text of
/// every evaluated file, and renders runtime errors with source snippets.
pub mod trace;

/// Literal evaluation.
///
/// Turns literal nodes into values, including interpolated strings, exec
/// strings and collection literals.
pub mod literal;

/// Unary operator evaluation logic.
///
/// Implements numeric negation, logical negation and bitwise complement.
pub mod unary;

/// Binary operator evaluation logic.
///
/// Handles every infix operator: arithmetic on the numeric tower,
/// comparisons, bitwise and set operators, sequence operators and the
/// short-circuit logical operators.
pub mod binary;

/// Conditional evaluation: `if`, `match` and `try`.
pub mod control;

/// Evaluation of loops and comprehensions.
///
/// Supports condition-driven loops, `for ... in` iteration with one or two
/// bindings, and list, set and map comprehensions.
pub mod for_loop;

/// Calls of user functions and builtins.
///
/// Binds positional, named and default parameters, enforces the call depth
/// limit and unwraps `return` markers.
pub mod call;

/// Indexing and member access.
pub mod index;

/// Assignment to names and to list and map elements.
pub mod assign;

/// `import` statements and `eval` expressions.
///
/// Both run freshly parsed source: imports in a new module frame, `eval` in
/// the current frame.
pub mod import;

/// Builtin functions.
///
/// Holds the builtin registry and every builtin family available to
/// programs.
pub mod function;
