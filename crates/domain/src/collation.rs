//! Case-insensitive comparison for name-like text.
//!
//! Storage adapters register [`localized_case_insensitive`] under
//! [`COLLATION_NAME`] so that `ORDER BY` and `=` on collated columns agree
//! with in-memory comparisons.

use std::cmp::Ordering;

/// Name the collation is registered under in the storage engine.
pub const COLLATION_NAME: &str = "localized_case_insensitive";

/// Compare two strings ignoring case, using Unicode lowercase mapping.
///
/// Strings differing only by case compare equal.
#[must_use]
pub fn localized_case_insensitive(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
