//! User repository contracts and SQLite implementation.

use super::{ensure_valid_id, required_id, RepoResult};
use crate::db::allocator::{allocate, BusinessKey};
use crate::model::user::{User, UserId};
use log::debug;
use rusqlite::{params, Connection, Row};

/// Repository interface for user operations.
pub trait UserRepository {
    fn get_all_users(&self) -> RepoResult<Vec<User>>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Inserts a user with a caller-chosen business id (import path).
    fn add_user(&self, user: &User) -> RepoResult<()>;
    /// Creates a user whose id is allocated from the row id.
    fn make_user(&self, name: &str) -> RepoResult<User>;
    fn modify_user(&self, user: &User) -> RepoResult<bool>;
    fn delete_user(&self, user: &User) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn get_all_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, name FROM Users ORDER BY user_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        if id <= 0 {
            return Ok(None);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, name FROM Users WHERE user_id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        debug!("event=user_get module=repo status=not_found user_id={}", id);
        Ok(None)
    }

    fn add_user(&self, user: &User) -> RepoResult<()> {
        ensure_valid_id(user.id, "user")?;
        self.conn.execute(
            "INSERT INTO Users (user_id, name) VALUES (?1, ?2);",
            params![user.id, user.name.as_str()],
        )?;
        Ok(())
    }

    fn make_user(&self, name: &str) -> RepoResult<User> {
        let id = allocate(
            self.conn,
            "make_user",
            BusinessKey::new("Users", "user_id"),
            |conn| {
                conn.execute(
                    "INSERT INTO Users (user_id, name) VALUES (NULL, ?1);",
                    [name],
                )
            },
            |conn, row_id, id| {
                conn.execute(
                    "UPDATE Users SET user_id = ?2 WHERE id = ?1;",
                    params![row_id, id],
                )
            },
        )?;
        Ok(User::new(id, name))
    }

    fn modify_user(&self, user: &User) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE Users SET name = ?2 WHERE user_id = ?1;",
            params![user.id, user.name.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn delete_user(&self, user: &User) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM Users WHERE user_id = ?1;", [user.id])?;
        Ok(changed > 0)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: required_id(row, "user_id", "Users")?,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
    })
}
