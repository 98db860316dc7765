//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `Tasks` keyed by business id.
//! - Decorate tasks with the derived `subscribed` flag in the same query.
//!
//! # Invariants
//! - Root tasks are stored with parent `0`; `0` and `NULL` read back as `None`.
//! - Deleting a task does not touch its subscriptions or child tasks.

use super::{ensure_valid_id, required_id, RepoError, RepoResult};
use crate::db::allocator::{allocate, BusinessKey};
use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, Row};

/// Repository interface for task operations.
pub trait TaskRepository {
    fn get_all_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Inserts a task with a caller-chosen business id (seed/import path).
    fn add_task(&self, task: &Task) -> RepoResult<()>;
    /// Creates a task whose id is allocated from the row id.
    fn make_task(&self, name: &str, parent: Option<TaskId>) -> RepoResult<Task>;
    fn modify_task(&self, task: &Task) -> RepoResult<bool>;
    fn delete_task(&self, task: &Task) -> RepoResult<bool>;
}

/// SQLite-backed task repository.
///
/// Unscoped, `subscribed` means "any user subscribed"; scoped with
/// [`SqliteTaskRepository::for_user`] it reflects that user only.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
    user: Option<UserId>,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn, user: None }
    }

    /// Scopes the derived `subscribed` flag to one user.
    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user = Some(user_id);
        self
    }

    fn select_sql(&self, filter: &str) -> String {
        let subscriptions = if self.user.is_some() {
            "SELECT DISTINCT task FROM Subscriptions WHERE user_id = :user_id"
        } else {
            "SELECT DISTINCT task FROM Subscriptions"
        };
        format!(
            "SELECT
                t.task_id AS task_id,
                t.parent AS parent,
                t.name AS name,
                s.task IS NOT NULL AS subscribed
             FROM Tasks t
             LEFT JOIN ({subscriptions}) s ON s.task = t.task_id
             {filter}
             ORDER BY t.task_id ASC;"
        )
    }

    fn query_tasks(&self, filter: &str, task_id: Option<TaskId>) -> RepoResult<Vec<Task>> {
        let sql = self.select_sql(filter);
        let mut bindings: Vec<(&str, &dyn ToSql)> = Vec::new();
        if let Some(user_id) = self.user.as_ref() {
            bindings.push((":user_id", user_id));
        }
        if let Some(task_id) = task_id.as_ref() {
            bindings.push((":task_id", task_id));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(bindings.as_slice())?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn get_all_tasks(&self) -> RepoResult<Vec<Task>> {
        self.query_tasks("", None)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        if id <= 0 {
            return Ok(None);
        }
        let mut tasks = self.query_tasks("WHERE t.task_id = :task_id", Some(id))?;
        // task_id is UNIQUE, so at most one row comes back.
        Ok(tasks.pop())
    }

    fn add_task(&self, task: &Task) -> RepoResult<()> {
        ensure_valid_id(task.id, "task")?;
        self.conn.execute(
            "INSERT INTO Tasks (task_id, parent, name) VALUES (?1, ?2, ?3);",
            params![task.id, parent_to_db(task.parent), task.name.as_str()],
        )?;
        Ok(())
    }

    fn make_task(&self, name: &str, parent: Option<TaskId>) -> RepoResult<Task> {
        let id = allocate(
            self.conn,
            "make_task",
            BusinessKey::new("Tasks", "task_id"),
            |conn| {
                conn.execute(
                    "INSERT INTO Tasks (task_id, parent, name) VALUES (NULL, ?1, ?2);",
                    params![parent_to_db(parent), name],
                )
            },
            |conn, row_id, id| {
                conn.execute(
                    "UPDATE Tasks SET task_id = ?2 WHERE id = ?1;",
                    params![row_id, id],
                )
            },
        )?;

        Ok(Task {
            id,
            parent: parent.filter(|value| *value > 0),
            name: name.to_string(),
            subscribed: false,
        })
    }

    fn modify_task(&self, task: &Task) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE Tasks SET name = ?2, parent = ?3 WHERE task_id = ?1;",
            params![task.id, task.name.as_str(), parent_to_db(task.parent)],
        )?;
        Ok(changed > 0)
    }

    fn delete_task(&self, task: &Task) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM Tasks WHERE task_id = ?1;", [task.id])?;
        Ok(changed > 0)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id = required_id(row, "task_id", "Tasks")?;
    let parent = row
        .get::<_, Option<i64>>("parent")?
        .filter(|value| *value > 0);
    let subscribed = match row.get::<_, i64>("subscribed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid subscribed flag `{other}` for task {id}"
            )));
        }
    };

    Ok(Task {
        id,
        parent,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        subscribed,
    })
}

fn parent_to_db(parent: Option<TaskId>) -> i64 {
    parent.filter(|value| *value > 0).unwrap_or(0)
}
