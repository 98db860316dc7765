//! Subscription repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(user_id, task)` pairs are kept unique by checking before inserting
//!   inside one transaction scope. The database itself has no constraint,
//!   so a writer bypassing this repository can still add duplicates.

use super::{ensure_valid_id, RepoResult};
use crate::db::TransactionScope;
use crate::model::subscription::Subscription;
use crate::model::task::Task;
use crate::model::user::{User, UserId};
use log::debug;
use rusqlite::{params, Connection, Row};

/// Repository interface for user-to-task subscriptions.
pub trait SubscriptionRepository {
    fn get_all_subscriptions(&self) -> RepoResult<Vec<Subscription>>;
    fn subscriptions_for_user(&self, user_id: UserId) -> RepoResult<Vec<Subscription>>;
    /// Subscribes `user` to `task`. Succeeds without writing when the
    /// subscription already exists.
    fn add_subscription(&self, user: &User, task: &Task) -> RepoResult<()>;
    fn delete_subscription(&self, user: &User, task: &Task) -> RepoResult<bool>;
}

/// SQLite-backed subscription repository.
pub struct SqliteSubscriptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubscriptionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository<'_> {
    fn get_all_subscriptions(&self) -> RepoResult<Vec<Subscription>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, task FROM Subscriptions ORDER BY user_id ASC, task ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next()? {
            subscriptions.push(parse_subscription_row(row)?);
        }
        Ok(subscriptions)
    }

    fn subscriptions_for_user(&self, user_id: UserId) -> RepoResult<Vec<Subscription>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, task FROM Subscriptions WHERE user_id = ?1 ORDER BY task ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next()? {
            subscriptions.push(parse_subscription_row(row)?);
        }
        Ok(subscriptions)
    }

    fn add_subscription(&self, user: &User, task: &Task) -> RepoResult<()> {
        ensure_valid_id(user.id, "user")?;
        ensure_valid_id(task.id, "task")?;

        let scope = TransactionScope::begin(self.conn, "add_subscription")?;
        let exists: i64 = scope.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM Subscriptions WHERE user_id = ?1 AND task = ?2
            );",
            params![user.id, task.id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            debug!(
                "event=subscription_add module=repo status=skipped reason=exists user_id={} task_id={}",
                user.id, task.id
            );
            return Ok(());
        }

        scope.execute(
            "INSERT INTO Subscriptions (user_id, task) VALUES (?1, ?2);",
            params![user.id, task.id],
        )?;
        scope.commit()?;
        Ok(())
    }

    fn delete_subscription(&self, user: &User, task: &Task) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM Subscriptions WHERE user_id = ?1 AND task = ?2;",
            params![user.id, task.id],
        )?;
        Ok(changed > 0)
    }
}

fn parse_subscription_row(row: &Row<'_>) -> RepoResult<Subscription> {
    Ok(Subscription {
        user_id: row.get::<_, Option<i64>>("user_id")?.unwrap_or(0),
        task_id: row.get::<_, Option<i64>>("task")?.unwrap_or(0),
    })
}
