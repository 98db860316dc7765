//! Typed schema declaration and the schema manager.
//!
//! # Responsibility
//! - Declare the six tables as a static (name, column, type) table.
//! - Verify table presence and create missing tables idempotently.
//! - Record the schema version and run the optional seeder on fresh databases.
//!
//! # Invariants
//! - `create()` never drops or rewrites an existing table.
//! - Business id columns are distinct from the `id` row id column.
//! - Per-table creation failures are reported, not fatal; seeding failures
//!   roll the whole pass back.

use super::transaction::TransactionScope;
use super::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::{Connection, OptionalExtension};

/// Schema version written by this build.
pub const DATABASE_VERSION: u32 = 1;

/// MetaData key holding the schema version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnDef {
    ColumnDef { name, sql_type }
}

/// Row id type of tables whose ids are handed out by the allocator; row ids
/// of deleted rows are never reissued.
const ALLOCATED_ROW_ID: &str = "INTEGER PRIMARY KEY AUTOINCREMENT";

pub const TABLES: &[TableDef] = &[
    TableDef {
        name: "MetaData",
        columns: &[
            col("id", "INTEGER PRIMARY KEY"),
            col("key", "VARCHAR(128) UNIQUE"),
            col("value", "VARCHAR(128)"),
        ],
    },
    TableDef {
        name: "Installations",
        columns: &[
            col("id", ALLOCATED_ROW_ID),
            col("inst_id", "INTEGER"),
            col("name", "VARCHAR(256)"),
        ],
    },
    TableDef {
        name: "Tasks",
        columns: &[
            col("id", ALLOCATED_ROW_ID),
            col("task_id", "INTEGER UNIQUE"),
            col("parent", "INTEGER"),
            col("name", "VARCHAR(256)"),
        ],
    },
    TableDef {
        name: "Events",
        columns: &[
            col("id", ALLOCATED_ROW_ID),
            col("event_id", "INTEGER"),
            col("installation_id", "INTEGER"),
            col("task", "INTEGER"),
            col("comment", "VARCHAR(256)"),
            // Unix epoch milliseconds.
            col("start", "INTEGER"),
            col("end", "INTEGER"),
        ],
    },
    TableDef {
        name: "Subscriptions",
        columns: &[
            col("id", "INTEGER PRIMARY KEY"),
            col("user_id", "INTEGER"),
            col("task", "INTEGER"),
        ],
    },
    TableDef {
        name: "Users",
        columns: &[
            col("id", ALLOCATED_ROW_ID),
            col("user_id", "INTEGER UNIQUE"),
            col("name", "VARCHAR(256)"),
        ],
    },
];

/// Collaborator that fills a freshly created database with initial rows.
///
/// Runs inside the schema creation transaction, so it must not open a
/// `TransactionScope` of its own.
pub trait Seeder {
    /// Inserts initial rows and returns how many were written.
    fn seed(&self, conn: &Connection) -> Result<usize, String>;
}

/// Outcome of one `create()` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    /// Tables created by this pass.
    pub created: Vec<&'static str>,
    /// Tables whose `CREATE TABLE` failed.
    pub failed: Vec<&'static str>,
    /// Rows written by the seeder, when it ran.
    pub seeded_rows: Option<usize>,
}

impl CreateReport {
    /// True when no table creation failed.
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl TableDef {
    /// Renders the `CREATE TABLE` statement with quoted column names.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("\"{}\" {}", column.name, column.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({});", self.name, columns)
    }
}

/// Returns true iff every required table exists.
///
/// Column shape and stored version are not inspected here.
pub fn verify(conn: &Connection) -> DbResult<bool> {
    Ok(missing_tables(conn)?.is_empty())
}

/// Lists required tables absent from the live schema, in declaration order.
pub fn missing_tables(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let mut missing = Vec::new();
    for table in TABLES {
        if !table_exists(conn, table.name)? {
            missing.push(table.name);
        }
    }
    Ok(missing)
}

/// Creates every missing table, then records the version and seeds.
///
/// Version and seeder only run when this pass created at least one table,
/// so calling `create()` on a complete database changes nothing.
///
/// # Errors
/// - `DbError::NestedTransaction` when called inside another scope.
/// - `DbError::SeedFailed` when the seeder fails; nothing is kept.
/// - `DbError::Sqlite` for failures outside per-table creation.
pub fn create(conn: &Connection, seeder: Option<&dyn Seeder>) -> DbResult<CreateReport> {
    let scope = TransactionScope::begin(conn, "schema_create")?;
    let mut report = CreateReport::default();

    for table in TABLES {
        if table_exists(&scope, table.name)? {
            continue;
        }
        match scope.execute_batch(&table.create_sql()) {
            Ok(()) => {
                info!(
                    "event=schema_create module=db status=ok table={}",
                    table.name
                );
                report.created.push(table.name);
            }
            Err(err) => {
                error!(
                    "event=schema_create module=db status=error table={} error={}",
                    table.name, err
                );
                report.failed.push(table.name);
            }
        }
    }

    if !report.created.is_empty() && !report.failed.contains(&"MetaData") {
        scope.execute(
            "INSERT OR IGNORE INTO MetaData (\"key\", \"value\") VALUES (?1, ?2);",
            rusqlite::params![SCHEMA_VERSION_KEY, DATABASE_VERSION.to_string()],
        )?;
    }

    if let Some(seeder) = seeder {
        if report.created.is_empty() {
            info!("event=schema_seed module=db status=skipped reason=existing_schema");
        } else if !report.succeeded() {
            warn!(
                "event=schema_seed module=db status=skipped reason=incomplete_schema failed={}",
                report.failed.join(",")
            );
        } else {
            let rows = seeder.seed(&scope).map_err(|message| {
                error!(
                    "event=schema_seed module=db status=error error={}",
                    message
                );
                DbError::SeedFailed(message)
            })?;
            info!("event=schema_seed module=db status=ok rows={}", rows);
            report.seeded_rows = Some(rows);
        }
    }

    scope.commit()?;
    Ok(report)
}

/// Reads the schema version recorded in MetaData.
///
/// Returns `None` when the key is absent. A value that is not a number is
/// reported as an invariant violation.
pub fn stored_version(conn: &Connection) -> DbResult<Option<u32>> {
    let value: Option<Option<String>> = conn
        .query_row(
            "SELECT \"value\" FROM MetaData WHERE \"key\" = ?1;",
            [SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value.flatten() {
        None => Ok(None),
        Some(text) => text.trim().parse::<u32>().map(Some).map_err(|_| {
            DbError::invariant(
                "schema_version",
                format!("stored schema version `{text}` is not a number"),
            )
        }),
    }
}

/// Ensures the schema exists and is not newer than this build.
pub(crate) fn ensure_schema(conn: &Connection, seeder: Option<&dyn Seeder>) -> DbResult<()> {
    if !verify(conn)? {
        let report = create(conn, seeder)?;
        if !report.succeeded() {
            return Err(DbError::SchemaIncomplete(report.failed));
        }
    }

    if let Some(db_version) = stored_version(conn)? {
        if db_version > DATABASE_VERSION {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported: DATABASE_VERSION,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
