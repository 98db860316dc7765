use std::io::Write;
use tally_core::db::schema;
use tally_core::{
    import_task_codes, open_db, open_db_in_memory, open_db_with_seeder, SqliteTaskRepository,
    TaskCodeSeeder, TaskRepository,
};

#[test]
fn seeded_child_gets_parent_from_code_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seeded.db");
    let seeder = TaskCodeSeeder::from_text("1200 ParentGroup\n1234 ChildItem\n");

    let conn = open_db_with_seeder(&path, &seeder).unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let child = repo.get_task(1234).unwrap().unwrap();
    assert_eq!(child.name, "ChildItem");
    assert_eq!(child.parent, Some(1200));
    assert_eq!(repo.get_task(1200).unwrap().unwrap().parent, None);
}

#[test]
fn reopening_does_not_seed_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seeded.db");
    let seeder = TaskCodeSeeder::from_text("1000 Internal\n1100 Meetings\n");

    drop(open_db_with_seeder(&path, &seeder).unwrap());
    let conn = open_db_with_seeder(&path, &seeder).unwrap();

    assert_eq!(
        SqliteTaskRepository::new(&conn).get_all_tasks().unwrap().len(),
        2
    );
}

#[test]
fn seeder_reads_file_and_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let codes = dir.path().join("projectcodes.txt");
    let mut file = std::fs::File::create(&codes).unwrap();
    writeln!(file, "-- project codes --").unwrap();
    writeln!(file, "1000-1999 - Internal").unwrap();
    writeln!(file, "1000 Internal").unwrap();
    writeln!(file, "1010 Holidays").unwrap();
    drop(file);

    let conn = open_db_with_seeder(
        dir.path().join("a.db"),
        &TaskCodeSeeder::from_path(&codes).unwrap(),
    )
    .unwrap();
    let holidays = SqliteTaskRepository::new(&conn)
        .get_task(1010)
        .unwrap()
        .unwrap();
    assert_eq!(holidays.parent, Some(1000));

    let missing = TaskCodeSeeder::from_path(dir.path().join("missing.txt")).unwrap();
    let empty = open_db_with_seeder(dir.path().join("b.db"), &missing).unwrap();
    assert!(schema::verify(&empty).unwrap());
    assert!(SqliteTaskRepository::new(&empty)
        .get_all_tasks()
        .unwrap()
        .is_empty());
}

#[test]
fn failing_seed_leaves_no_schema_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");
    let seeder = TaskCodeSeeder::from_text("1000 Internal\n1000 Duplicate\n");

    assert!(open_db_with_seeder(&path, &seeder).is_err());

    let conn = rusqlite::Connection::open(&path).unwrap();
    assert!(!schema::verify(&conn).unwrap());
    drop(conn);
    assert!(open_db(&path).is_ok());
}

#[test]
fn import_into_existing_database() {
    let conn = open_db_in_memory().unwrap();

    let written = import_task_codes(&conn, "1200 ParentGroup\n1234 ChildItem\n").unwrap();
    assert_eq!(written, 2);

    let child = SqliteTaskRepository::new(&conn)
        .get_task(1234)
        .unwrap()
        .unwrap();
    assert_eq!(child.parent, Some(1200));
}

#[test]
fn failed_import_keeps_database_unchanged() {
    let conn = open_db_in_memory().unwrap();
    import_task_codes(&conn, "1000 Internal\n").unwrap();

    assert!(import_task_codes(&conn, "2000 New\n1000 Clash\n").is_err());

    let ids: Vec<i64> = SqliteTaskRepository::new(&conn)
        .get_all_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(ids, vec![1000]);
}
