//! Booking orchestrator.

use std::sync::Arc;
use std::time::Duration;

use booking_store::{BookingStore, StoreError};
use chrono::Utc;
use clients::{CatalogClient, EventPublisher, IdentityClient, PaymentGateway, Room};
use common::{BookingId, CallerIdentity, HotelId, UserId};
use domain::{
    Booking, BookingMessage, BookingRequest, BookingStatus, DateRange, NewBooking, PaymentRequest,
};

use crate::authorization::{OwnerLookup, authorize_hotel_access, authorize_user_access};
use crate::error::{BookingError, Result};

/// Attempts made when the store reports a serialization failure on insert.
const MAX_INSERT_ATTEMPTS: u32 = 3;

/// Settings the orchestrator needs from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL the payment gateway calls back, e.g. `http://booking-service:8080`.
    pub webhook_base_url: String,
    /// Bound on the whole webhook reconciliation chain.
    pub webhook_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: "http://booking-service:8080".to_string(),
            webhook_timeout: Duration::from_secs(10),
        }
    }
}

/// Drives the booking saga across the store and the remote services.
///
/// Every collaborator sits behind a trait object so production adapters and
/// in-memory implementations can be mixed freely.
#[derive(Clone)]
pub struct BookingOrchestrator {
    pub(crate) store: Arc<dyn BookingStore>,
    pub(crate) catalog: Arc<dyn CatalogClient>,
    pub(crate) identity: Arc<dyn IdentityClient>,
    pub(crate) payment: Arc<dyn PaymentGateway>,
    pub(crate) publisher: Arc<dyn EventPublisher>,
    pub(crate) config: OrchestratorConfig,
}

impl BookingOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        store: Arc<dyn BookingStore>,
        catalog: Arc<dyn CatalogClient>,
        identity: Arc<dyn IdentityClient>,
        payment: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            identity,
            payment,
            publisher,
            config,
        }
    }

    /// Reserves a room and hands the payment off to the gateway.
    ///
    /// Returns as soon as the gateway accepts the request; the outcome arrives
    /// later through [`handle_payment_webhook`](Self::handle_payment_webhook).
    /// The gateway is never contacted for a conflicting booking.
    #[tracing::instrument(
        skip(self, request, caller),
        fields(room_id = %request.room_id, hotel_id = %request.hotel_id, user_id = %caller.user_id)
    )]
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
        caller: &CallerIdentity,
    ) -> Result<BookingId> {
        let new_booking = request.to_new_booking(caller.user_id)?;
        let amount = request.amount()?;

        let booking_id = self.insert_booking(new_booking).await?;
        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(%booking_id, "Booking reserved, dispatching payment");

        let message = BookingMessage::for_guest(booking_id, request, caller);
        let payment = PaymentRequest::new(
            message,
            request.card_number.clone(),
            amount,
            &self.config.webhook_base_url,
        );

        if let Err(err) = self.payment.dispatch(&payment).await {
            metrics::counter!("payment_dispatch_failures_total").increment(1);
            tracing::error!(%booking_id, error = %err, "Payment dispatch failed, releasing room");
            self.compensate_failed_dispatch(booking_id).await;
            return Err(BookingError::Internal(format!(
                "payment dispatch failed: {err}"
            )));
        }

        Ok(booking_id)
    }

    /// Inserts the booking, retrying when concurrent transactions collide.
    ///
    /// A retried insert re-runs the overlap check, so a lost race surfaces as
    /// `Conflict` rather than a storage error.
    async fn insert_booking(&self, new_booking: NewBooking) -> Result<BookingId> {
        let room_id = new_booking.room_id;
        let mut attempt = 1;

        loop {
            match self.store.create_booking(new_booking.clone()).await {
                Ok(id) => return Ok(id),
                Err(StoreError::BookingAlreadyExists { .. }) => {
                    metrics::counter!("booking_conflicts_total").increment(1);
                    tracing::info!(%room_id, "Booking rejected: room already held");
                    return Err(BookingError::Conflict { room_id });
                }
                Err(err) if err.is_retryable() && attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::warn!(%room_id, attempt, error = %err, "Retrying booking insert");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Marks a booking whose payment never reached the gateway as failed.
    ///
    /// Best effort: if this fails too, the booking stays `pending` until the
    /// stale-booking sweep expires it.
    async fn compensate_failed_dispatch(&self, booking_id: BookingId) {
        if let Err(err) = self
            .store
            .update_booking_status(booking_id, BookingStatus::Failed)
            .await
        {
            tracing::warn!(%booking_id, error = %err, "Compensation failed, booking left pending");
        }
    }

    /// Lists a user's own bookings.
    #[tracing::instrument(skip(self, caller), fields(caller_id = %caller.user_id))]
    pub async fn get_bookings_by_user_id(
        &self,
        caller: &CallerIdentity,
        user_id: UserId,
    ) -> Result<Vec<Booking>> {
        authorize_user_access(user_id, caller.user_id)?;
        Ok(self.store.get_bookings_by_user_id(user_id).await?)
    }

    /// Lists a hotel's bookings after confirming the caller owns it.
    #[tracing::instrument(skip(self, caller), fields(caller_id = %caller.user_id))]
    pub async fn get_bookings_by_hotel_id(
        &self,
        caller: &CallerIdentity,
        hotel_id: HotelId,
    ) -> Result<Vec<Booking>> {
        let lookup = self.lookup_owner(hotel_id).await?;
        authorize_hotel_access(hotel_id, lookup, caller.user_id)?;
        Ok(self.store.get_bookings_by_hotel_id(hotel_id).await?)
    }

    /// Rooms of a hotel with no active booking overlapping `period`, in catalog order.
    #[tracing::instrument(skip(self))]
    pub async fn get_available_rooms(
        &self,
        hotel_id: HotelId,
        period: DateRange,
    ) -> Result<Vec<Room>> {
        let (rooms, unavailable) = tokio::try_join!(
            async {
                self.catalog
                    .get_rooms_by_hotel_id(hotel_id)
                    .await
                    .map_err(BookingError::from)
            },
            async {
                self.store
                    .get_unavailable_room_ids(hotel_id, period)
                    .await
                    .map_err(|e| BookingError::Internal(e.to_string()))
            },
        )?;

        Ok(rooms
            .into_iter()
            .filter(|room| !unavailable.contains(&room.id))
            .collect())
    }

    /// Fails every booking still `pending` after `ttl`.
    #[tracing::instrument(skip(self))]
    pub async fn expire_stale_bookings(&self, ttl: Duration) -> Result<Vec<BookingId>> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| BookingError::InvalidInput(format!("invalid ttl: {e}")))?;
        let expired = self.store.expire_pending(Utc::now() - ttl).await?;

        if !expired.is_empty() {
            metrics::counter!("stale_bookings_expired_total").increment(expired.len() as u64);
            tracing::info!(count = expired.len(), "Expired stale pending bookings");
        }
        Ok(expired)
    }

    /// Resolves a hotel's owner, keeping not-found apart from other failures.
    pub(crate) async fn lookup_owner(&self, hotel_id: HotelId) -> Result<OwnerLookup> {
        match self.catalog.get_owner_id_by_hotel_id(hotel_id).await {
            Ok(owner) => Ok(OwnerLookup::Owner(owner)),
            Err(err) if err.is_not_found() => Ok(OwnerLookup::NotFound),
            Err(err) => Err(err.into()),
        }
    }
}
