//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create events through the identifier allocator, stamped with the
//!   installation passed in by the caller.
//! - Provide read/modify/delete over `Events`.
//!
//! # Invariants
//! - `event_id` is unique within one installation only.
//! - `get_event` finding more than one row is an invariant violation.
//! - Writes reject an end earlier than the start.

use super::{ensure_valid_id, required_id, RepoError, RepoResult};
use crate::db::allocator::{allocate, BusinessKey};
use crate::db::TransactionScope;
use crate::model::event::{Event, EventId};
use crate::model::installation::InstallationContext;
use log::error;
use rusqlite::{params, Connection, Row};

const EVENT_SELECT_SQL: &str = r#"SELECT
    event_id,
    installation_id,
    task,
    comment,
    start,
    "end"
FROM Events"#;

/// Repository interface for event operations.
pub trait EventRepository {
    fn get_all_events(&self) -> RepoResult<Vec<Event>>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Inserts an event that already carries its ids (import path).
    fn add_event(&self, event: &Event) -> RepoResult<()>;
    /// Allocates a new, empty event for the given installation.
    fn make_event(&self, installation: &InstallationContext) -> RepoResult<Event>;
    fn modify_event(&self, event: &Event) -> RepoResult<bool>;
    fn delete_event(&self, event: &Event) -> RepoResult<bool>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn get_all_events(&self) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} ORDER BY installation_id ASC, event_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        if id <= 0 {
            return Ok(None);
        }
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE event_id = ?1;"))?;
        let mut rows = stmt.query([id])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let event = parse_event_row(row)?;

        if rows.next()?.is_some() {
            error!(
                "event=event_get module=repo status=error error_code=invariant_violation event_id={}",
                id
            );
            return Err(RepoError::invariant(
                "get_event",
                format!("event id {id} matches more than one row"),
            ));
        }
        Ok(Some(event))
    }

    fn add_event(&self, event: &Event) -> RepoResult<()> {
        ensure_valid_id(event.id, "event")?;
        ensure_valid_id(event.installation_id, "installation")?;
        event.validate()?;

        let scope = TransactionScope::begin(self.conn, "add_event")?;
        let exists: i64 = scope.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM Events WHERE event_id = ?1 AND installation_id = ?2
            );",
            params![event.id, event.installation_id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(RepoError::InvalidEntity(format!(
                "event {} already exists in installation {}",
                event.id, event.installation_id
            )));
        }

        scope.execute(
            r#"INSERT INTO Events (event_id, installation_id, task, comment, start, "end")
               VALUES (?1, ?2, ?3, ?4, ?5, ?6);"#,
            params![
                event.id,
                event.installation_id,
                event.task_id,
                event.comment.as_str(),
                event.start,
                event.end,
            ],
        )?;
        scope.commit()?;
        Ok(())
    }

    fn make_event(&self, installation: &InstallationContext) -> RepoResult<Event> {
        let installation_id = installation.installation_id();
        let id = allocate(
            self.conn,
            "make_event",
            BusinessKey::new("Events", "event_id").within("installation_id", installation_id),
            |conn| conn.execute("INSERT INTO Events DEFAULT VALUES;", []),
            |conn, row_id, id| {
                conn.execute(
                    "UPDATE Events SET event_id = ?2, installation_id = ?3 WHERE id = ?1;",
                    params![row_id, id, installation_id],
                )
            },
        )?;

        Ok(Event {
            id,
            installation_id,
            ..Event::default()
        })
    }

    fn modify_event(&self, event: &Event) -> RepoResult<bool> {
        event.validate()?;
        let changed = self.conn.execute(
            r#"UPDATE Events
               SET task = ?3, comment = ?4, start = ?5, "end" = ?6
               WHERE event_id = ?1 AND installation_id = ?2;"#,
            params![
                event.id,
                event.installation_id,
                event.task_id,
                event.comment.as_str(),
                event.start,
                event.end,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_event(&self, event: &Event) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM Events WHERE event_id = ?1 AND installation_id = ?2;",
            params![event.id, event.installation_id],
        )?;
        Ok(changed > 0)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let event = Event {
        id: required_id(row, "event_id", "Events")?,
        installation_id: required_id(row, "installation_id", "Events")?,
        task_id: row.get::<_, Option<i64>>("task")?.unwrap_or(0),
        comment: row.get::<_, Option<String>>("comment")?.unwrap_or_default(),
        start: row.get("start")?,
        end: row.get("end")?,
    };
    event
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("event {}: {err}", event.id)))?;
    Ok(event)
}
