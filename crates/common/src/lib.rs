//! Shared types for the room-booking services.

pub mod caller;
pub mod types;

pub use caller::CallerIdentity;
pub use types::{BookingId, HotelId, RoomId, UserId};
