//! Installation identity and the explicit installation context.
//!
//! # Invariants
//! - An installation id is immutable once allocated.
//! - `InstallationContext` only ever wraps a valid (positive) id.

use super::is_valid_id;
use serde::{Deserialize, Serialize};

/// Business identifier of an installation (`Installations.inst_id`).
pub type InstallationId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub id: InstallationId,
    pub name: String,
}

impl Installation {
    pub fn new(id: InstallationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_id(self.id)
    }

    /// Builds the context for installation-scoped calls.
    ///
    /// Returns `None` for an unallocated installation.
    pub fn context(&self) -> Option<InstallationContext> {
        InstallationContext::new(self.id)
    }
}

/// The installation on whose behalf installation-scoped rows are created.
///
/// Passed explicitly into every installation-scoped repository call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstallationContext {
    installation_id: InstallationId,
}

impl InstallationContext {
    pub fn new(installation_id: InstallationId) -> Option<Self> {
        is_valid_id(installation_id).then_some(Self { installation_id })
    }

    pub fn installation_id(&self) -> InstallationId {
        self.installation_id
    }
}
