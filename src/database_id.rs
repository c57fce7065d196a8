//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
/// Alias for the ID of an [Expense](crate::Expense).
pub type ExpenseID = DatabaseID;
