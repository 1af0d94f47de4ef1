//! Booking saga orchestration.
//!
//! A booking is a multi-step transaction spread over several services:
//! 1. Reserve the room (conflict-checked insert, status `pending`)
//! 2. Hand the payment off to the asynchronous payment processor
//! 3. On the payment webhook, settle the status and notify guest and hotelier
//!
//! If the payment hand-off fails the reservation is compensated by marking it
//! `failed`, which frees the room.

pub mod authorization;
pub mod coordinator;
pub mod error;
mod webhook;

pub use authorization::{OwnerLookup, authorize_hotel_access, authorize_user_access};
pub use coordinator::{BookingOrchestrator, OrchestratorConfig};
pub use error::{BookingError, Result};
