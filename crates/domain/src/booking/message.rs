//! Notification payload shared by the event bus and the payment gateway.

use chrono::{DateTime, Utc};
use common::{BookingId, CallerIdentity, HotelId};
use serde::{Deserialize, Serialize};

use super::BookingRequest;

/// Format used for the human-readable dates carried in a [`BookingMessage`].
const MESSAGE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders a UTC timestamp the way notifications display it.
pub fn format_message_date(date: DateTime<Utc>) -> String {
    date.format(MESSAGE_DATE_FORMAT).to_string()
}

/// Who a [`BookingMessage`] is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub chat_id: String,
}

/// Booking details addressed to one recipient.
///
/// Sent to the payment gateway as opaque metadata, echoed back on the webhook,
/// and published to the event bus once per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingMessage {
    pub booking_id: BookingId,
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub room_description: String,
    pub room_number: i32,
    pub user_name: String,
    pub chat_id: String,
    pub start_date: String,
    pub end_date: String,
}

impl BookingMessage {
    /// Guest-facing rendering: the recipient is the booking creator.
    pub fn for_guest(
        booking_id: BookingId,
        request: &BookingRequest,
        caller: &CallerIdentity,
    ) -> Self {
        Self {
            booking_id,
            hotel_id: request.hotel_id,
            hotel_name: request.hotel_name.clone(),
            room_description: request.room_description.clone(),
            room_number: request.room_number,
            user_name: caller.username.clone(),
            chat_id: caller.chat_id.clone(),
            start_date: format_message_date(request.start_date),
            end_date: format_message_date(request.end_date),
        }
    }

    /// Same booking, room and dates, addressed to someone else.
    pub fn with_recipient(&self, recipient: &Recipient) -> Self {
        Self {
            user_name: recipient.name.clone(),
            chat_id: recipient.chat_id.clone(),
            ..self.clone()
        }
    }
}
