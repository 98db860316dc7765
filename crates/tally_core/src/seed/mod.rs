//! Initial data import for fresh databases.
//!
//! # Responsibility
//! - Parse line-oriented task-code resources into tasks.
//! - Infer the task tree from the numeric structure of task codes.
//! - Plug into schema creation through the `Seeder` collaborator trait.

pub mod task_codes;
