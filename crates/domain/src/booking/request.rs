//! Inbound booking request.

use chrono::{DateTime, Utc};
use common::{HotelId, RoomId, UserId};
use serde::Deserialize;

use super::{DateRange, NewBooking};
use crate::DomainError;

/// A request to reserve a room, as posted by a guest.
///
/// The card number is only passed through to the payment gateway and is
/// never persisted or logged.
#[derive(Clone, Deserialize)]
pub struct BookingRequest {
    pub room_id: RoomId,
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub room_description: String,
    #[serde(default)]
    pub room_number: i32,
    pub count_of_people: i64,
    pub room_base_price: i64,
    pub card_number: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl BookingRequest {
    /// Total price charged for the stay: people × base price.
    pub fn amount(&self) -> Result<i64, DomainError> {
        if self.count_of_people <= 0 {
            return Err(DomainError::InvalidRequest(format!(
                "count_of_people must be positive, got {}",
                self.count_of_people
            )));
        }
        if self.room_base_price < 0 {
            return Err(DomainError::InvalidRequest(format!(
                "room_base_price must not be negative, got {}",
                self.room_base_price
            )));
        }
        self.count_of_people
            .checked_mul(self.room_base_price)
            .ok_or_else(|| DomainError::InvalidRequest("amount overflows".to_string()))
    }

    /// The requested stay as a validated half-open interval.
    pub fn period(&self) -> Result<DateRange, DomainError> {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Builds the row to insert for the given guest.
    pub fn to_new_booking(&self, user_id: UserId) -> Result<NewBooking, DomainError> {
        Ok(NewBooking {
            user_id,
            room_id: self.room_id,
            hotel_id: self.hotel_id,
            period: self.period()?,
        })
    }
}

impl std::fmt::Debug for BookingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingRequest")
            .field("room_id", &self.room_id)
            .field("hotel_id", &self.hotel_id)
            .field("hotel_name", &self.hotel_name)
            .field("room_number", &self.room_number)
            .field("count_of_people", &self.count_of_people)
            .field("room_base_price", &self.room_base_price)
            .field("card_number", &"<redacted>")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .finish()
    }
}
