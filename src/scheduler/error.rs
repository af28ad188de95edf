//! Error types for the scheduler module

use std::fmt;

use chrono::NaiveDate;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
///
/// These are precondition and validation failures. They are kept apart from
/// data-store errors so callers can render an actionable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Some slots of the batch have no guide
    UnassignedSlots {
        count: usize,
    },

    /// The batch to publish or update is empty
    EmptyBatch {
        operation: String,
    },

    /// A submitted slot row could not be interpreted
    InvalidSlot {
        index: usize,
        reason: String,
    },

    /// Date range with end before start
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnassignedSlots { count } => {
                write!(f, "Cannot publish: {} unassigned slots", count)
            }
            Self::EmptyBatch { operation } => {
                write!(f, "No {} provided", operation)
            }
            Self::InvalidSlot { index, reason } => {
                write!(f, "Invalid slot at position {}: {}", index, reason)
            }
            Self::InvalidRange { start, end } => {
                write!(f, "Invalid date range: {} is before {}", end, start)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an unassigned slots error
    pub fn unassigned(count: usize) -> Self {
        Self::UnassignedSlots { count }
    }

    /// Create an empty batch error
    pub fn empty_batch(operation: impl Into<String>) -> Self {
        Self::EmptyBatch {
            operation: operation.into(),
        }
    }

    /// Create an invalid slot error
    pub fn invalid_slot(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSlot {
            index,
            reason: reason.into(),
        }
    }
}
