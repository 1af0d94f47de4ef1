//! Payment webhook reconciliation.

use booking_store::{StatusUpdate, StoreError};
use common::{BookingId, HotelId};
use domain::{
    BookingMessage, Channel, Disposition, Effect, PaymentResponse, Recipient, plan_reconciliation,
};

use crate::authorization::OwnerLookup;
use crate::coordinator::BookingOrchestrator;
use crate::error::{BookingError, Result};

impl BookingOrchestrator {
    /// Settles a booking from the payment gateway's callback.
    ///
    /// The echoed metadata's booking id is authoritative; a `booking_id` taken
    /// from the callback URL must agree with it. The status is durably written
    /// before any notification, and every channel's delivery is recorded once
    /// the bus acknowledges it. A redelivered callback therefore only sends
    /// what an earlier, interrupted attempt left out.
    ///
    /// The whole chain is bounded by the configured webhook timeout.
    #[tracing::instrument(
        skip(self, response),
        fields(booking_id = %response.meta_data.booking_id, status = %response.status)
    )]
    pub async fn handle_payment_webhook(
        &self,
        query_booking_id: Option<BookingId>,
        response: PaymentResponse,
    ) -> Result<Disposition> {
        let booking_id = response.meta_data.booking_id;
        if let Some(query_id) = query_booking_id {
            if query_id != booking_id {
                return Err(BookingError::InvalidInput(format!(
                    "callback booking_id {query_id} does not match metadata booking_id {booking_id}"
                )));
            }
        }

        metrics::counter!("payment_webhooks_total", "status" => response.status.as_str())
            .increment(1);

        match tokio::time::timeout(self.config.webhook_timeout, self.reconcile(response)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(%booking_id, "Webhook reconciliation timed out");
                Err(BookingError::Internal(
                    "webhook reconciliation timed out".to_string(),
                ))
            }
        }
    }

    async fn reconcile(&self, response: PaymentResponse) -> Result<Disposition> {
        let message = response.meta_data;
        let booking_id = message.booking_id;

        // The gateway only calls back for bookings this service created.
        let booking = self
            .store
            .get_booking(booking_id)
            .await
            .map_err(|e| BookingError::Internal(e.to_string()))?
            .ok_or_else(|| {
                tracing::error!("Payment callback for unknown booking");
                BookingError::Internal(format!("payment callback for unknown booking {booking_id}"))
            })?;

        let plan = plan_reconciliation(booking.status, booking.deliveries(), response.status);
        match plan.disposition {
            Disposition::Transition => {}
            Disposition::Resumed => {
                tracing::info!(
                    status = %booking.status,
                    outstanding = plan.effects.len(),
                    "Resuming undelivered notifications"
                );
            }
            Disposition::Duplicate => {
                tracing::info!(status = %booking.status, "Duplicate payment callback ignored");
                return Ok(Disposition::Duplicate);
            }
            Disposition::Contradicting => {
                tracing::warn!(
                    stored = %booking.status,
                    incoming = %response.status,
                    "Payment callback contradicts settled booking, ignoring"
                );
                return Ok(Disposition::Contradicting);
            }
        }

        let notifies = plan.notifies();
        for effect in plan.effects {
            match effect {
                Effect::PersistStatus(status) => {
                    match self.store.update_booking_status(booking_id, status).await {
                        Ok(StatusUpdate::Applied) => {
                            tracing::info!(%status, notifies, "Booking settled");
                        }
                        // A concurrent delivery settled it first and owns the fan-out.
                        Ok(StatusUpdate::Unchanged) => return Ok(Disposition::Duplicate),
                        Err(StoreError::InvalidTransition { .. }) => {
                            tracing::warn!(%status, "Booking settled concurrently with another outcome");
                            return Ok(Disposition::Contradicting);
                        }
                        Err(err) => return Err(BookingError::Internal(err.to_string())),
                    }
                }
                Effect::Notify(channel) => self.deliver(channel, &message).await?,
            }
        }

        Ok(plan.disposition)
    }

    /// Publishes the confirmation on one channel, then records the delivery.
    ///
    /// A crash between the two leaves the channel outstanding, so a retried
    /// callback publishes it again (at-least-once).
    async fn deliver(&self, channel: Channel, message: &BookingMessage) -> Result<()> {
        let addressed = match channel {
            Channel::Guest => message.clone(),
            Channel::Hotelier => {
                let hotelier = self.resolve_hotelier(message.hotel_id).await?;
                message.with_recipient(&hotelier)
            }
        };

        self.notify(channel, &addressed).await?;

        self.store
            .mark_notified(message.booking_id, channel)
            .await
            .map_err(|e| {
                tracing::error!(%channel, error = %e, "Failed to record notification delivery");
                BookingError::Internal(format!("{channel} delivery not recorded: {e}"))
            })
    }

    /// Owner of the hotel as a notification recipient.
    ///
    /// An unknown hotel is `HotelNotFound`; an owner the identity service does
    /// not know is an inconsistency and therefore `Internal`.
    async fn resolve_hotelier(&self, hotel_id: HotelId) -> Result<Recipient> {
        let owner_id = match self.lookup_owner(hotel_id).await? {
            OwnerLookup::Owner(owner_id) => owner_id,
            OwnerLookup::NotFound => return Err(BookingError::HotelNotFound(hotel_id)),
        };

        self.identity
            .get_hotelier_information(owner_id)
            .await
            .map_err(|e| {
                tracing::error!(%hotel_id, %owner_id, error = %e, "Hotelier identity lookup failed");
                BookingError::Internal(format!("hotelier lookup failed: {e}"))
            })
    }

    async fn notify(&self, channel: Channel, message: &BookingMessage) -> Result<()> {
        self.publisher.publish(channel, message).await.map_err(|e| {
            tracing::error!(%channel, error = %e, "Notification publish failed");
            BookingError::Internal(format!("{channel} notification failed: {e}"))
        })?;

        metrics::counter!("notifications_published_total", "channel" => channel.as_str())
            .increment(1);
        Ok(())
    }
}
