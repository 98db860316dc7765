//! Business identifier allocation on top of SQLite row ids.
//!
//! # Responsibility
//! - Turn the engine-assigned row id of a freshly inserted row into the
//!   caller-visible business id of that row.
//! - Skip row ids already taken by imported rows (`add_*` with explicit ids).
//!
//! # Invariants
//! - Insert, row-id read and patch run inside one `TransactionScope`; any
//!   failure rolls the insert back so no unallocated row survives.
//! - Allocated ids are strictly positive.
//! - The patch step touches exactly one row.
//! - After the patch exactly one row holds the allocated id within its
//!   `BusinessKey` partition.

use super::transaction::TransactionScope;
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::{params, Connection};

/// Column holding the business id that an allocation must keep unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessKey {
    pub table: &'static str,
    pub column: &'static str,
    /// Column and value the id is unique within, e.g. the owning installation.
    pub partition: Option<(&'static str, i64)>,
}

impl BusinessKey {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column,
            partition: None,
        }
    }

    pub const fn within(self, column: &'static str, value: i64) -> Self {
        Self {
            partition: Some((column, value)),
            ..self
        }
    }

    fn holders(&self, conn: &Connection, id: i64) -> rusqlite::Result<i64> {
        match self.partition {
            Some((column, value)) => conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?1 AND {} = ?2;",
                    self.table, self.column, column
                ),
                params![id, value],
                |row| row.get(0),
            ),
            None => conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?1;",
                    self.table, self.column
                ),
                [id],
                |row| row.get(0),
            ),
        }
    }

    /// First id above every business id in the table, across partitions.
    fn next_free(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.query_row(
            &format!(
                "SELECT COALESCE(MAX({}), 0) + 1 FROM {};",
                self.column, self.table
            ),
            [],
            |row| row.get(0),
        )
    }
}

/// Runs the insert -> read row id -> patch protocol and returns the id.
///
/// `insert` must add exactly one row with its business id left empty.
/// The row id becomes the business id unless `key` already holds it; then
/// the id above the current maximum is used instead. `patch` receives the
/// row id and the chosen business id and must write the business id (and
/// any installation stamp) into that row, returning the changed row count.
///
/// # Errors
/// - `DbError::Sqlite` when a statement fails.
/// - `DbError::InvariantViolation` when the row id is not positive, the
///   patch did not update exactly one row or the id ends up shared.
/// - `DbError::NestedTransaction` when called inside another scope.
pub fn allocate<I, P>(
    conn: &Connection,
    context: &'static str,
    key: BusinessKey,
    insert: I,
    patch: P,
) -> DbResult<i64>
where
    I: FnOnce(&Connection) -> rusqlite::Result<usize>,
    P: FnOnce(&Connection, i64, i64) -> rusqlite::Result<usize>,
{
    let scope = TransactionScope::begin(conn, context)?;

    let inserted = insert(&*scope)?;
    if inserted != 1 {
        return Err(violation(
            context,
            format!("insert step added {inserted} rows, expected 1"),
        ));
    }

    let row_id = scope.last_insert_rowid();
    if row_id <= 0 {
        return Err(violation(context, format!("row id {row_id} is not positive")));
    }

    let id = if key.holders(&scope, row_id)? == 0 {
        row_id
    } else {
        let next = key.next_free(&scope)?;
        info!(
            "event=id_allocate module=db status=skipped context={} reason=taken row_id={} id={}",
            context, row_id, next
        );
        next
    };

    let patched = patch(&*scope, row_id, id)?;
    if patched != 1 {
        return Err(violation(
            context,
            format!("patch step updated {patched} rows for row id {row_id}, expected 1"),
        ));
    }

    let holders = key.holders(&scope, id)?;
    if holders != 1 {
        return Err(violation(
            context,
            format!("id {id} is held by {holders} rows in {}", key.table),
        ));
    }

    scope.commit()?;
    debug!(
        "event=id_allocate module=db status=ok context={} row_id={} id={}",
        context, row_id, id
    );
    Ok(id)
}

fn violation(context: &'static str, detail: String) -> DbError {
    error!(
        "event=id_allocate module=db status=error context={} error_code=invariant_violation detail={}",
        context, detail
    );
    DbError::invariant(context, detail)
}
