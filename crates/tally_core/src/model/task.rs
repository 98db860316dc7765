//! Task domain model.
//!
//! Tasks form a tree by convention: `parent` names another task's business
//! id, and `None` marks a root. The tree is not enforced by the database.

use super::is_valid_id;
use serde::{Deserialize, Serialize};

/// Business identifier of a task (`Tasks.task_id`).
pub type TaskId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Parent task id. `None` means root-level task.
    pub parent: Option<TaskId>,
    pub name: String,
    /// Derived on read from Subscriptions; never written by task statements.
    #[serde(default)]
    pub subscribed: bool,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            parent: None,
            name: name.into(),
            subscribed: false,
        }
    }

    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_valid(&self) -> bool {
        is_valid_id(self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
