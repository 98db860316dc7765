use std::collections::HashSet;
use tally_core::db::open_db_in_memory;
use tally_core::{
    Event, EventRepository, InstallationContext, InstallationRepository, RepoError,
    SqliteEventRepository, SqliteInstallationRepository,
};

fn setup() -> (rusqlite::Connection, InstallationContext) {
    let conn = open_db_in_memory().unwrap();
    let installation = SqliteInstallationRepository::new(&conn)
        .create_installation("workstation")
        .unwrap();
    let context = installation.context().unwrap();
    (conn, context)
}

fn event_rows(conn: &rusqlite::Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM Events;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn make_event_returns_valid_event_stamped_with_installation() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let event = repo.make_event(&context).unwrap();
    assert!(event.id > 0);
    assert_eq!(event.installation_id, context.installation_id());
    assert_eq!(event.start, None);
    assert_eq!(event.end, None);

    let stored = repo.get_event(event.id).unwrap().unwrap();
    assert_eq!(stored, event);
}

#[test]
fn repeated_make_event_never_reuses_an_id() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let event = repo.make_event(&context).unwrap();
        assert!(seen.insert(event.id), "duplicate event id {}", event.id);
    }

    let stored: HashSet<i64> = repo
        .get_all_events()
        .unwrap()
        .into_iter()
        .map(|event| event.id)
        .collect();
    assert_eq!(stored, seen);
}

#[test]
fn failed_patch_step_rolls_back_the_insert() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);
    conn.execute_batch(
        "CREATE TRIGGER refuse_event_patch BEFORE UPDATE ON Events
         BEGIN
             SELECT RAISE(ABORT, 'patch refused');
         END;",
    )
    .unwrap();

    let err = repo.make_event(&context).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(!err.is_invariant_violation());
    assert_eq!(event_rows(&conn), 0);
    assert!(conn.is_autocommit());

    conn.execute_batch("DROP TRIGGER refuse_event_patch;").unwrap();
    let event = repo.make_event(&context).unwrap();
    assert!(event.is_valid());
    assert_eq!(event_rows(&conn), 1);
}

#[test]
fn get_event_with_duplicate_ids_across_installations_is_an_invariant_violation() {
    let (conn, _) = setup();
    let repo = SqliteEventRepository::new(&conn);

    for installation_id in [1, 2] {
        repo.add_event(&Event {
            id: 77,
            installation_id,
            task_id: 1000,
            ..Event::default()
        })
        .unwrap();
    }

    let err = repo.get_event(77).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(matches!(
        err,
        RepoError::InvariantViolation {
            context: "get_event",
            ..
        }
    ));
}

#[test]
fn add_event_rejects_duplicate_within_installation() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let event = Event {
        id: 10,
        installation_id: context.installation_id(),
        ..Event::default()
    };
    repo.add_event(&event).unwrap();

    let err = repo.add_event(&event).unwrap_err();
    assert!(matches!(err, RepoError::InvalidEntity(_)));
    assert_eq!(event_rows(&conn), 1);
}

#[test]
fn modify_event_persists_fields_and_rejects_reversed_window() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let mut event = repo.make_event(&context).unwrap();
    event.task_id = 1234;
    event.comment = "code review".to_string();
    event.start = Some(1_700_000_000_000);
    event.end = Some(1_700_000_360_000);
    assert!(repo.modify_event(&event).unwrap());

    let stored = repo.get_event(event.id).unwrap().unwrap();
    assert_eq!(stored, event);
    assert_eq!(stored.duration_ms(), Some(360_000));

    let mut reversed = event.clone();
    reversed.end = Some(1_600_000_000_000);
    let err = repo.modify_event(&reversed).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.get_event(event.id).unwrap().unwrap(), event);
}

#[test]
fn modify_and_delete_are_scoped_to_the_event_installation() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let event = repo.make_event(&context).unwrap();
    let foreign = Event {
        installation_id: context.installation_id() + 1,
        ..event.clone()
    };

    assert!(!repo.modify_event(&foreign).unwrap());
    assert!(!repo.delete_event(&foreign).unwrap());
    assert!(repo.delete_event(&event).unwrap());
    assert!(repo.get_event(event.id).unwrap().is_none());
}

#[test]
fn get_event_for_unallocated_id_returns_none() {
    let (conn, _) = setup();
    let repo = SqliteEventRepository::new(&conn);

    assert!(repo.get_event(0).unwrap().is_none());
    assert!(repo.get_event(12345).unwrap().is_none());
}

#[test]
fn make_event_skips_an_id_imported_into_the_same_installation() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let imported = Event {
        id: 2,
        installation_id: context.installation_id(),
        task_id: 1000,
        ..Event::default()
    };
    repo.add_event(&imported).unwrap();

    let made = repo.make_event(&context).unwrap();
    assert_ne!(made.id, imported.id);
    assert!(made.is_valid());

    let sharing: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM Events WHERE event_id = ?1 AND installation_id = ?2;",
            [imported.id, context.installation_id()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(sharing, 1);
    assert_eq!(repo.get_event(imported.id).unwrap(), Some(imported));
    assert_eq!(repo.get_event(made.id).unwrap(), Some(made));
}

#[test]
fn deleted_event_id_is_not_handed_out_again() {
    let (conn, context) = setup();
    let repo = SqliteEventRepository::new(&conn);

    let first = repo.make_event(&context).unwrap();
    assert!(repo.delete_event(&first).unwrap());

    let second = repo.make_event(&context).unwrap();
    assert!(second.id > first.id);
}
