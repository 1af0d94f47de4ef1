use common::{BookingId, RoomId};
use domain::{DateRange, DomainError};
use thiserror::Error;

/// SQLSTATE codes Postgres uses when a transaction lost a serialization race.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Errors that can occur when interacting with the booking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An active booking for the same room overlaps the requested interval.
    #[error("Booking already exists for room {room_id} in {period}")]
    BookingAlreadyExists { room_id: RoomId, period: DateRange },

    /// No booking with the given id.
    #[error("Booking not found: {0}")]
    NotFound(BookingId),

    /// The stored status does not allow the requested change.
    #[error("Invalid status change for booking {booking_id}: {source}")]
    InvalidTransition {
        booking_id: BookingId,
        #[source]
        source: DomainError,
    },

    /// The transaction lost a serialization race and may be retried as a whole.
    #[error("Serialization failure, transaction can be retried: {0}")]
    SerializationFailure(#[source] sqlx::Error),

    /// A stored row could not be mapped back to the domain.
    #[error("Corrupt booking row: {0}")]
    Corrupt(#[from] DomainError),

    /// The backing storage is not reachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::SerializationFailure(_) | StoreError::Unavailable(_)
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                StoreError::SerializationFailure(err)
            }
            _ => match err {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                    StoreError::Unavailable(err.to_string())
                }
                other => StoreError::Database(other),
            },
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
