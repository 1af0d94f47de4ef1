//! Adapters for the services the booking saga talks to.
//!
//! Each seam is a trait with an HTTP (or Kafka) implementation for production
//! and an in-memory implementation with failure toggles for tests.

pub mod catalog;
pub mod error;
mod http;
mod metered;
pub mod identity;
pub mod payment;
pub mod publisher;

pub use catalog::{CatalogClient, HttpCatalogClient, InMemoryCatalogClient, Room};
pub use error::{ClientError, Result};
pub use identity::{HttpIdentityClient, IdentityClient, InMemoryIdentityClient};
pub use payment::{HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway};
pub use domain::Channel;
pub use publisher::{EventPublisher, InMemoryEventPublisher, KafkaEventPublisher};
