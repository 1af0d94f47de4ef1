//! Domain error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::BookingStatus;

/// Errors raised by pure domain validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// The end of a date range does not come after its start.
    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A status change that the booking lifecycle does not allow.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// A stored status string that is not part of the lifecycle.
    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),

    /// A booking request that cannot be priced or stored.
    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),
}
