//! Event domain model.
//!
//! # Responsibility
//! - Represent one tracked time interval booked against a task.
//!
//! # Invariants
//! - `id` is unique within `installation_id`, not globally.
//! - `end` must not be earlier than `start` when both are set.
//! - Times are Unix epoch milliseconds.

use super::installation::InstallationId;
use super::is_valid_id;
use super::task::TaskId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Business identifier of an event (`Events.event_id`).
pub type EventId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValidationError {
    InvalidTimeWindow { start: i64, end: i64 },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeWindow { start, end } => {
                write!(f, "event end ({end}) must be >= start ({start})")
            }
        }
    }
}

impl Error for EventValidationError {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub installation_id: InstallationId,
    /// Booked task; `0` until a task is assigned.
    pub task_id: TaskId,
    pub comment: String,
    pub start: Option<i64>,
    /// Open events have no end yet.
    pub end: Option<i64>,
}

impl Event {
    pub fn is_valid(&self) -> bool {
        is_valid_id(self.id)
    }

    /// Checks the time window.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(EventValidationError::InvalidTimeWindow { start, end });
            }
        }
        Ok(())
    }

    /// Duration in milliseconds for closed events.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventValidationError};

    #[test]
    fn validate_rejects_reversed_window() {
        let event = Event {
            start: Some(2_000),
            end: Some(1_000),
            ..Event::default()
        };
        assert_eq!(
            event.validate(),
            Err(EventValidationError::InvalidTimeWindow {
                start: 2_000,
                end: 1_000
            })
        );
    }

    #[test]
    fn open_event_has_no_duration() {
        let mut event = Event {
            start: Some(1_000),
            ..Event::default()
        };
        assert!(event.validate().is_ok());
        assert_eq!(event.duration_ms(), None);

        event.end = Some(61_000);
        assert_eq!(event.duration_ms(), Some(60_000));
    }
}
