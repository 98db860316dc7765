//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide per-entity CRUD over the six-table schema.
//! - Run creation operations through the identifier allocator.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Absence is never an error: reads return `None`, modify/delete return
//!   `false` when no row matched.
//! - Integrity failures surface as `RepoError::InvariantViolation`, distinct
//!   from statement failures (`RepoError::Db`).

use crate::db::DbError;
use crate::model::event::EventValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod event_repo;
pub mod installation_repo;
pub mod metadata_repo;
pub mod subscription_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Statement or connection failure from the storage engine.
    Db(DbError),
    /// Caller supplied an entity that cannot be written as is.
    InvalidEntity(String),
    Validation(EventValidationError),
    /// Persisted row cannot be converted to a valid entity.
    InvalidData(String),
    /// Data-integrity or programming error; not retryable.
    InvariantViolation {
        context: &'static str,
        detail: String,
    },
}

impl RepoError {
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    pub(crate) fn invariant(context: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            context,
            detail: detail.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidEntity(message) => write!(f, "invalid entity: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InvariantViolation { context, detail } => {
                write!(f, "invariant violated in {context}: {detail}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidEntity(_) => None,
            Self::InvalidData(_) => None,
            Self::InvariantViolation { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::InvariantViolation { context, detail } => {
                Self::InvariantViolation { context, detail }
            }
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<EventValidationError> for RepoError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Reads a business id column, rejecting NULL and non-positive values.
pub(crate) fn required_id(
    row: &rusqlite::Row<'_>,
    column: &str,
    table: &str,
) -> RepoResult<i64> {
    match row.get::<_, Option<i64>>(column)? {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(RepoError::InvalidData(format!(
            "non-positive id `{id}` in {table}.{column}"
        ))),
        None => Err(RepoError::InvalidData(format!(
            "missing id in {table}.{column}"
        ))),
    }
}

pub(crate) fn ensure_valid_id(id: i64, what: &str) -> RepoResult<()> {
    if id > 0 {
        Ok(())
    } else {
        Err(RepoError::InvalidEntity(format!(
            "{what} id must be positive, got {id}"
        )))
    }
}
