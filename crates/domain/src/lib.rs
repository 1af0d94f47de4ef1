//! Domain layer for the room-booking service.
//!
//! This crate holds the pure parts of the booking saga:
//! - `Booking` and its closed `BookingStatus` lifecycle with an explicit transition function
//! - `DateRange` with the half-open overlap predicate shared by every availability check
//! - `BookingRequest` and the `BookingMessage` guest/hotelier renderings
//! - payment gateway wire contracts
//! - notification channels and the per-channel delivery record
//! - the webhook reconciliation planner

pub mod booking;
pub mod error;
pub mod notification;
pub mod payment;
pub mod reconcile;

pub use booking::{
    Booking, BookingMessage, BookingRequest, BookingStatus, DateRange, NewBooking, Recipient,
    StatusTransition, format_message_date,
};
pub use error::DomainError;
pub use notification::{Channel, Deliveries};
pub use payment::{PaymentRequest, PaymentResponse, PaymentStatus, webhook_url};
pub use reconcile::{Disposition, Effect, ReconciliationPlan, plan_reconciliation};
