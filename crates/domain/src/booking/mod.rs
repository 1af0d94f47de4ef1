//! Booking entity and related value types.

mod message;
mod request;
mod state;
mod value_objects;

pub use message::{BookingMessage, Recipient, format_message_date};
pub use request::BookingRequest;
pub use state::{BookingStatus, StatusTransition};
pub use value_objects::DateRange;

use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::Deliveries;

/// A persisted room reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub hotel_id: HotelId,
    pub status: BookingStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_notified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotelier_notified_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Returns the half-open interval this booking occupies.
    pub fn period(&self) -> DateRange {
        DateRange::from_trusted(self.start_date, self.end_date)
    }

    /// Returns true if this booking still holds its room.
    pub fn holds_room(&self) -> bool {
        self.status.holds_room()
    }

    /// Channels whose confirmation has already been published.
    pub fn deliveries(&self) -> Deliveries {
        Deliveries {
            guest: self.guest_notified_at.is_some(),
            hotelier: self.hotelier_notified_at.is_some(),
        }
    }
}

/// A booking about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub hotel_id: HotelId,
    pub period: DateRange,
}
