use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use domain::{Booking, BookingStatus, Channel, DateRange, NewBooking, StatusTransition};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{BookingStore, StatusUpdate},
};

#[derive(Default)]
struct InMemoryState {
    bookings: Vec<Booking>,
    next_id: i64,
}

/// In-memory booking store for testing.
///
/// A single write lock serializes inserts, which gives the same overlap
/// guarantee the PostgreSQL store gets from SERIALIZABLE transactions.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<InMemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the total number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    /// Returns a snapshot of all stored bookings.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.state.read().await.bookings.clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingId> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let conflict = state.bookings.iter().any(|existing| {
            existing.room_id == booking.room_id
                && existing.holds_room()
                && existing.period().overlaps(&booking.period)
        });
        if conflict {
            return Err(StoreError::BookingAlreadyExists {
                room_id: booking.room_id,
                period: booking.period,
            });
        }

        state.next_id += 1;
        let id = BookingId::new(state.next_id);
        state.bookings.push(Booking {
            id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            hotel_id: booking.hotel_id,
            status: BookingStatus::Pending,
            start_date: booking.period.start(),
            end_date: booking.period.end(),
            created_at: Utc::now(),
            guest_notified_at: None,
            hotelier_notified_at: None,
        });

        Ok(id)
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.bookings.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn get_bookings_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_bookings_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Booking>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn get_unavailable_room_ids(
        &self,
        hotel_id: HotelId,
        period: DateRange,
    ) -> Result<HashSet<RoomId>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.hotel_id == hotel_id && b.holds_room() && b.period().overlaps(&period))
            .map(|b| b.room_id)
            .collect())
    }

    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<StatusUpdate> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(StoreError::NotFound(booking_id))?;

        match booking.status.transition_to(status) {
            Ok(StatusTransition::Changed) => {
                booking.status = status;
                Ok(StatusUpdate::Applied)
            }
            Ok(StatusTransition::Unchanged) => Ok(StatusUpdate::Unchanged),
            Err(source) => Err(StoreError::InvalidTransition { booking_id, source }),
        }
    }

    async fn mark_notified(&self, booking_id: BookingId, channel: Channel) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(StoreError::NotFound(booking_id))?;

        let marker = match channel {
            Channel::Guest => &mut booking.guest_notified_at,
            Channel::Hotelier => &mut booking.hotelier_notified_at,
        };
        marker.get_or_insert_with(Utc::now);
        Ok(())
    }

    async fn expire_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<BookingId>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let mut expired = Vec::new();
        for booking in state
            .bookings
            .iter_mut()
            .filter(|b| b.status == BookingStatus::Pending && b.created_at < created_before)
        {
            booking.status = BookingStatus::Failed;
            expired.push(booking.id);
        }
        Ok(expired)
    }
}
