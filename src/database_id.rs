//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a registered customer.
pub type CustomerId = DatabaseId;
/// The ID of a recorded purchase.
pub type PurchaseId = DatabaseId;
