//! Installation repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `inst_id` is written once, by allocation or import, and never updated.
//! - `inst_id` has no UNIQUE constraint; imports pre-check for duplicates.

use super::{ensure_valid_id, required_id, RepoError, RepoResult};
use crate::db::allocator::{allocate, BusinessKey};
use crate::db::TransactionScope;
use crate::model::installation::{Installation, InstallationId};
use rusqlite::{params, Connection, Row};

/// Repository interface for installation operations.
pub trait InstallationRepository {
    fn get_all_installations(&self) -> RepoResult<Vec<Installation>>;
    fn get_installation(&self, id: InstallationId) -> RepoResult<Option<Installation>>;
    /// Inserts an installation with a known id (import path).
    fn add_installation(&self, installation: &Installation) -> RepoResult<()>;
    /// Registers a new installation with an allocated id.
    fn create_installation(&self, name: &str) -> RepoResult<Installation>;
    /// Renames an installation. The id itself cannot change.
    fn modify_installation(&self, installation: &Installation) -> RepoResult<bool>;
    fn delete_installation(&self, installation: &Installation) -> RepoResult<bool>;
}

/// SQLite-backed installation repository.
pub struct SqliteInstallationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInstallationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl InstallationRepository for SqliteInstallationRepository<'_> {
    fn get_all_installations(&self) -> RepoResult<Vec<Installation>> {
        let mut stmt = self
            .conn
            .prepare("SELECT inst_id, name FROM Installations ORDER BY inst_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut installations = Vec::new();
        while let Some(row) = rows.next()? {
            installations.push(parse_installation_row(row)?);
        }
        Ok(installations)
    }

    fn get_installation(&self, id: InstallationId) -> RepoResult<Option<Installation>> {
        if id <= 0 {
            return Ok(None);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT inst_id, name FROM Installations WHERE inst_id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_installation_row(row)?));
        }
        Ok(None)
    }

    fn add_installation(&self, installation: &Installation) -> RepoResult<()> {
        ensure_valid_id(installation.id, "installation")?;

        let scope = TransactionScope::begin(self.conn, "add_installation")?;
        let exists: i64 = scope.query_row(
            "SELECT EXISTS(SELECT 1 FROM Installations WHERE inst_id = ?1);",
            [installation.id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(RepoError::InvalidEntity(format!(
                "installation {} already exists",
                installation.id
            )));
        }
        scope.execute(
            "INSERT INTO Installations (inst_id, name) VALUES (?1, ?2);",
            params![installation.id, installation.name.as_str()],
        )?;
        scope.commit()?;
        Ok(())
    }

    fn create_installation(&self, name: &str) -> RepoResult<Installation> {
        let id = allocate(
            self.conn,
            "create_installation",
            BusinessKey::new("Installations", "inst_id"),
            |conn| {
                conn.execute(
                    "INSERT INTO Installations (inst_id, name) VALUES (NULL, ?1);",
                    [name],
                )
            },
            |conn, row_id, id| {
                conn.execute(
                    "UPDATE Installations SET inst_id = ?2 WHERE id = ?1;",
                    params![row_id, id],
                )
            },
        )?;
        Ok(Installation::new(id, name))
    }

    fn modify_installation(&self, installation: &Installation) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE Installations SET name = ?2 WHERE inst_id = ?1;",
            params![installation.id, installation.name.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn delete_installation(&self, installation: &Installation) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM Installations WHERE inst_id = ?1;",
            [installation.id],
        )?;
        Ok(changed > 0)
    }
}

fn parse_installation_row(row: &Row<'_>) -> RepoResult<Installation> {
    Ok(Installation {
        id: required_id(row, "inst_id", "Installations")?,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
    })
}
