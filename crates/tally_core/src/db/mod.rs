//! SQLite storage bootstrap, schema lifecycle and unit-of-work primitives.
//!
//! # Responsibility
//! - Open and configure the single SQLite connection of a storage instance.
//! - Verify and create the six-table schema before any data access.
//! - Provide the transaction scope and the identifier allocator that
//!   repositories build on.
//!
//! # Invariants
//! - Core code must not read/write application data before the schema exists.
//! - Invariant violations are reported as `DbError::InvariantViolation` in
//!   every build, never as debug-only assertions.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocator;
mod open;
pub mod schema;
pub mod transaction;

pub use open::{open_db, open_db_in_memory, open_db_with_seeder};
pub use schema::{CreateReport, Seeder, DATABASE_VERSION};
pub use transaction::TransactionScope;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Tables still missing after a create pass.
    SchemaIncomplete(Vec<&'static str>),
    /// A transaction scope was requested while another one is open.
    NestedTransaction,
    /// Data-integrity or programming error; not retryable.
    InvariantViolation {
        context: &'static str,
        detail: String,
    },
    SeedFailed(String),
}

impl DbError {
    pub(crate) fn invariant(context: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            context,
            detail: detail.into(),
        }
    }
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
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaIncomplete(tables) => {
                write!(f, "database schema is missing tables: {}", tables.join(", "))
            }
            Self::NestedTransaction => {
                write!(f, "a transaction is already open on this connection")
            }
            Self::InvariantViolation { context, detail } => {
                write!(f, "invariant violated in {context}: {detail}")
            }
            Self::SeedFailed(message) => write!(f, "seeding failed: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::SchemaIncomplete(_) => None,
            Self::NestedTransaction => None,
            Self::InvariantViolation { .. } => None,
            Self::SeedFailed(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
