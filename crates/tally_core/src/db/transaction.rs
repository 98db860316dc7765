//! Guarded unit-of-work over one SQLite connection.
//!
//! # Responsibility
//! - Begin an immediate `rusqlite::Transaction` when the scope is created.
//! - Roll back on every exit path unless `commit()` was called.
//!
//! # Invariants
//! - State moves `Pending -> Committed` (explicit) or
//!   `Pending -> RolledBack` (on drop). No other transitions exist.
//! - Scopes never nest: beginning one on a connection that already has an
//!   open transaction fails with `DbError::NestedTransaction`.

use super::{DbError, DbResult};
use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::ops::Deref;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Pending,
    Committed,
    RolledBack,
}

/// Transaction guard bound to the lifetime of a caller-held value.
///
/// Statements are issued through the scope, which dereferences to the
/// underlying connection.
pub struct TransactionScope<'conn> {
    conn: &'conn Connection,
    tx: Option<Transaction<'conn>>,
    label: &'static str,
    state: ScopeState,
}

impl<'conn> TransactionScope<'conn> {
    /// Begins an immediate transaction, taking the write lock up front.
    ///
    /// `label` only names the scope in log events.
    ///
    /// # Errors
    /// - `DbError::NestedTransaction` when a transaction is already open.
    /// - `DbError::Sqlite` when `BEGIN` fails (e.g. database locked).
    pub fn begin(conn: &'conn Connection, label: &'static str) -> DbResult<Self> {
        if !conn.is_autocommit() {
            error!(
                "event=tx_begin module=db status=error scope={} error_code=nested_transaction",
                label
            );
            return Err(DbError::NestedTransaction);
        }
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        debug!("event=tx_begin module=db status=ok scope={}", label);
        Ok(Self {
            conn,
            tx: Some(tx),
            label,
            state: ScopeState::Pending,
        })
    }

    /// Commits the transaction and consumes the scope.
    ///
    /// When `COMMIT` itself fails the transaction is rolled back before the
    /// error is returned.
    pub fn commit(mut self) -> DbResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        match tx.commit() {
            Ok(()) => {
                self.state = ScopeState::Committed;
                debug!("event=tx_commit module=db status=ok scope={}", self.label);
                Ok(())
            }
            Err(err) => {
                self.state = ScopeState::RolledBack;
                error!(
                    "event=tx_commit module=db status=error scope={} error={}",
                    self.label, err
                );
                Err(err.into())
            }
        }
    }

    fn rollback(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        match tx.rollback() {
            Ok(()) => {
                debug!("event=tx_rollback module=db status=ok scope={}", self.label);
            }
            // SQLite may already have rolled back on its own (e.g. after a
            // constraint abort with ROLLBACK resolution).
            Err(err) if self.conn.is_autocommit() => {
                debug!(
                    "event=tx_rollback module=db status=ok scope={} note=already_closed error={}",
                    self.label, err
                );
            }
            Err(err) => {
                warn!(
                    "event=tx_rollback module=db status=error scope={} error={}",
                    self.label, err
                );
            }
        }
        self.state = ScopeState::RolledBack;
    }
}

impl Deref for TransactionScope<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.state == ScopeState::Pending {
            self.rollback();
        }
    }
}
