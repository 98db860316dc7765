//! Storage core for Tally time tracking.
//! This crate is the single source of truth for persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;

pub use db::{open_db, open_db_in_memory, open_db_with_seeder, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::event::{Event, EventId, EventValidationError};
pub use model::installation::{Installation, InstallationContext, InstallationId};
pub use model::subscription::Subscription;
pub use model::task::{Task, TaskId};
pub use model::user::{User, UserId};
pub use repo::event_repo::{EventRepository, SqliteEventRepository};
pub use repo::installation_repo::{InstallationRepository, SqliteInstallationRepository};
pub use repo::metadata_repo::{MetaDataRepository, SqliteMetaDataRepository};
pub use repo::subscription_repo::{SqliteSubscriptionRepository, SubscriptionRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use seed::task_codes::{import_task_codes, parse_task_codes, TaskCodeSeeder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
