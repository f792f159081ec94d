//! Scalar SQL functions installed on every store connection.
//!
//! # Invariants
//! - `fold_case(text)` folds with full Unicode lowercase mapping, unlike
//!   SQLite's built-in `lower()`, which only folds ASCII.
//! - `fold_case(NULL)` is `NULL`.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

pub const FOLD_CASE_FUNCTION: &str = "fold_case";

/// Case folding shared by SQL predicates and Rust-side search needles.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

pub(crate) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.as_deref().map(fold_case))
        },
    )
}
