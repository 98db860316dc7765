//! User domain model.

use super::is_valid_id;
use serde::{Deserialize, Serialize};

/// Business identifier of a user (`Users.user_id`).
pub type UserId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_id(self.id)
    }
}
