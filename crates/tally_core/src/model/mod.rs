//! Value-typed entities persisted by the storage core.
//!
//! # Responsibility
//! - Define the records exchanged between repositories and collaborators.
//! - Provide validity checks for business identifiers.
//!
//! # Invariants
//! - Allocated business ids are strictly positive; `0` (or any
//!   non-positive value) marks an invalid/unallocated entity.
//! - Entities carry business ids only, never engine row ids.

pub mod event;
pub mod installation;
pub mod subscription;
pub mod task;
pub mod user;

/// Business id value that marks an invalid/unallocated entity.
pub const INVALID_ID: i64 = 0;

/// Returns whether `id` is an allocated business id.
pub fn is_valid_id(id: i64) -> bool {
    id > INVALID_ID
}
