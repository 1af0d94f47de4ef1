//! Booking status lifecycle.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// The status of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, awaiting the payment outcome.
    #[default]
    Pending,

    /// Payment succeeded (terminal state).
    Confirmed,

    /// Payment failed or never completed (terminal state).
    Failed,
}

/// Outcome of applying a status change to a stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// The stored status changes.
    Changed,
    /// The stored status already equals the requested one.
    Unchanged,
}

impl BookingStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Failed)
    }

    /// Returns true if a booking in this status blocks its room for its interval.
    pub fn holds_room(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Validates a move from `self` to `next`.
    ///
    /// Re-applying the current status is allowed and reported as `Unchanged`,
    /// which keeps status updates idempotent. Leaving a terminal state is an error.
    pub fn transition_to(self, next: BookingStatus) -> Result<StatusTransition, DomainError> {
        match (self, next) {
            (current, next) if current == next => Ok(StatusTransition::Unchanged),
            (BookingStatus::Pending, BookingStatus::Confirmed | BookingStatus::Failed) => {
                Ok(StatusTransition::Changed)
            }
            (from, to) => Err(DomainError::InvalidStatusTransition { from, to }),
        }
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "failed" => Ok(BookingStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}
