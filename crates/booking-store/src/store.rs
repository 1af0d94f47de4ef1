use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use domain::{Booking, BookingStatus, Channel, DateRange, NewBooking};

use crate::Result;

/// Result of a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The booking moved from `pending` to the requested status.
    Applied,
    /// The booking already had the requested status; nothing was written.
    Unchanged,
}

/// Core trait for booking storage.
///
/// All implementations must be thread-safe (Send + Sync). The store owns
/// transaction boundaries; callers never see a transaction handle.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a `pending` booking unless an active booking for the same room
    /// overlaps its interval.
    ///
    /// The overlap check and the insert run in one SERIALIZABLE transaction.
    /// Returns `BookingAlreadyExists` on overlap and `SerializationFailure`
    /// when a concurrent transaction won the race (retryable).
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingId>;

    /// Loads a single booking.
    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// All bookings made by a user, ordered by id. Empty when none exist.
    async fn get_bookings_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>>;

    /// All bookings for a hotel, ordered by id. Empty when none exist.
    async fn get_bookings_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Booking>>;

    /// Rooms of a hotel with an active booking overlapping `period`.
    async fn get_unavailable_room_ids(
        &self,
        hotel_id: HotelId,
        period: DateRange,
    ) -> Result<HashSet<RoomId>>;

    /// Moves a booking to `status`.
    ///
    /// Idempotent: re-applying the stored status returns `Unchanged`.
    /// Fails with `NotFound` for unknown ids and `InvalidTransition` when
    /// leaving a terminal status.
    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<StatusUpdate>;

    /// Records that the booking's confirmation was delivered on `channel`.
    ///
    /// Keeps the first delivery time when called again. Fails with
    /// `NotFound` for unknown ids.
    async fn mark_notified(&self, booking_id: BookingId, channel: Channel) -> Result<()>;

    /// Marks every booking still `pending` and created before `created_before`
    /// as `failed`, returning the affected ids.
    async fn expire_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<BookingId>>;
}

/// Records duration and outcome of a store operation.
pub(crate) async fn observe<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let status = if result.is_ok() { "ok" } else { "failed" };
    metrics::histogram!(
        "store_operation_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
    result
}
