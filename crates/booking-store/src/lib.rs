//! Room-availability store for the booking service.
//!
//! Persists bookings, answers availability questions, and performs the
//! conflict-checked insert that keeps a room from being double-booked.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use store::{BookingStore, StatusUpdate};
