//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open (and create when needed) a storage file to verify core wiring.
//! - Optionally seed a fresh database from a task-code file.
//!
//! Usage: `tally_cli <db-path> [task-codes-file]`
//!
//! `TALLY_LOG_DIR` enables file logging; `TALLY_LOG_LEVEL` overrides the
//! build-mode default level.

use std::process::ExitCode;
use tally_core::db::schema;
use tally_core::{
    core_version, default_log_level, init_logging, open_db, open_db_with_seeder, EventRepository,
    LoggingConfig, SqliteEventRepository, SqliteTaskRepository, TaskCodeSeeder, TaskRepository,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    init_logging_from_env()?;

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return Err("usage: tally_cli <db-path> [task-codes-file]".to_string());
    };

    let conn = match args.next() {
        Some(seed_path) => {
            let seeder = TaskCodeSeeder::from_path(&seed_path)
                .map_err(|err| format!("cannot read `{seed_path}`: {err}"))?;
            open_db_with_seeder(&db_path, &seeder)
        }
        None => open_db(&db_path),
    }
    .map_err(|err| err.to_string())?;

    let schema_ok = schema::verify(&conn).map_err(|err| err.to_string())?;
    let version = schema::stored_version(&conn).map_err(|err| err.to_string())?;
    let tasks = SqliteTaskRepository::new(&conn)
        .get_all_tasks()
        .map_err(|err| err.to_string())?;
    let events = SqliteEventRepository::new(&conn)
        .get_all_events()
        .map_err(|err| err.to_string())?;

    println!("tally_core version={}", core_version());
    println!(
        "db={} schema_ok={} schema_version={}",
        db_path,
        schema_ok,
        version.map_or_else(|| "none".to_string(), |value| value.to_string())
    );
    println!("tasks={} events={}", tasks.len(), events.len());
    log::info!(
        "event=cli_probe module=cli status=ok tasks={} events={}",
        tasks.len(),
        events.len()
    );
    Ok(())
}

fn init_logging_from_env() -> Result<(), String> {
    let Ok(log_dir) = std::env::var("TALLY_LOG_DIR") else {
        return Ok(());
    };
    let level = std::env::var("TALLY_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
    let config = LoggingConfig::new(&level, log_dir)?;
    init_logging(&config)
}
