/// Numeric conversion helpers.
///
/// Checked conversions between the primitive numeric types, the decimal
/// conversion used by the numeric tower, and index resolution for sequences.
/// Every fallible helper reports an `ArithmeticError` instead of truncating
/// silently.
pub mod num;
