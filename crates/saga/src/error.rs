//! Booking saga error types.

use booking_store::StoreError;
use clients::ClientError;
use common::{HotelId, RoomId};
use domain::DomainError;
use thiserror::Error;

/// Outcomes of orchestrator operations other than success.
///
/// Everything except `Internal` is caller-correctable and maps to a distinct
/// non-500 response at the HTTP boundary.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The room is already held for an overlapping interval.
    #[error("Room {room_id} is already booked for an overlapping period")]
    Conflict { room_id: RoomId },

    /// The caller is not allowed to see the requested resource.
    #[error("Forbidden access")]
    ForbiddenAccess,

    /// The hotel is not registered in the catalog.
    #[error("Hotel not found: {0}")]
    HotelNotFound(HotelId),

    /// Malformed request body or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage, transport or timeout failure. Detail is for logs only.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for BookingError {
    fn from(err: DomainError) -> Self {
        BookingError::InvalidInput(err.to_string())
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookingAlreadyExists { room_id, .. } => BookingError::Conflict { room_id },
            other => BookingError::Internal(other.to_string()),
        }
    }
}

impl From<ClientError> for BookingError {
    fn from(err: ClientError) -> Self {
        BookingError::Internal(err.to_string())
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, BookingError>;
