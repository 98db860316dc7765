//! Subscription join record.
//!
//! Uniqueness of `(user_id, task_id)` is maintained by check-then-insert in
//! the repository, not by a database constraint.

use super::task::TaskId;
use super::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,
    pub task_id: TaskId,
}

impl Subscription {
    pub fn new(user_id: UserId, task_id: TaskId) -> Self {
        Self { user_id, task_id }
    }
}
