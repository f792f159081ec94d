//! SQLite bootstrap for the todo order store.
//!
//! # Responsibility
//! - Open connections that are ready for concurrent relocation writes:
//!   foreign keys on, a busy timeout so a second writer queues behind an
//!   active `BEGIN IMMEDIATE` renumbering instead of failing.
//! - Install the scalar SQL functions listing relies on (`fold_case`).
//! - Bring the `todos` schema to the latest version before any row access.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database stamped by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod functions;
pub mod migrations;
mod open;

pub use functions::{fold_case, FOLD_CASE_FUNCTION};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "todo store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
