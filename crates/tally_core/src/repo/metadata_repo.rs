//! Key/value metadata store.
//!
//! # Invariants
//! - `set_metadata` is an upsert: last write wins, one row per key.
//! - `get_metadata` never creates a key.

use super::{RepoError, RepoResult};
use crate::db::TransactionScope;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for metadata operations.
pub trait MetaDataRepository {
    fn set_metadata(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns the stored value, or `None` when the key is absent.
    fn get_metadata(&self, key: &str) -> RepoResult<Option<String>>;
}

/// SQLite-backed metadata repository.
pub struct SqliteMetaDataRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetaDataRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MetaDataRepository for SqliteMetaDataRepository<'_> {
    fn set_metadata(&self, key: &str, value: &str) -> RepoResult<()> {
        if key.is_empty() {
            return Err(RepoError::InvalidEntity(
                "metadata key must not be empty".to_string(),
            ));
        }

        let scope = TransactionScope::begin(self.conn, "set_metadata")?;
        let exists: i64 = scope.query_row(
            r#"SELECT EXISTS(SELECT 1 FROM MetaData WHERE "key" = ?1);"#,
            [key],
            |row| row.get(0),
        )?;

        if exists == 1 {
            scope.execute(
                r#"UPDATE MetaData SET "value" = ?2 WHERE "key" = ?1;"#,
                params![key, value],
            )?;
        } else {
            scope.execute(
                r#"INSERT INTO MetaData ("key", "value") VALUES (?1, ?2);"#,
                params![key, value],
            )?;
        }
        scope.commit()?;
        Ok(())
    }

    fn get_metadata(&self, key: &str) -> RepoResult<Option<String>> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(
                r#"SELECT "value" FROM MetaData WHERE "key" = ?1;"#,
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.map(Option::unwrap_or_default))
    }
}
