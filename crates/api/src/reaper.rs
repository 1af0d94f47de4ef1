//! Background sweep that fails bookings stuck in `pending`.
//!
//! A booking stays `pending` forever if the payment gateway never calls back.
//! The reaper periodically marks those older than the TTL as `failed`, which
//! frees their rooms.

use std::time::Duration;

use saga::BookingOrchestrator;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawns the sweep loop. It exits when `shutdown` changes or its sender is dropped.
pub fn spawn(
    orchestrator: BookingOrchestrator,
    interval: Duration,
    ttl: Duration,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(?interval, ?ttl, "stale booking reaper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = orchestrator.expire_stale_bookings(ttl).await {
                        tracing::warn!(error = %err, "stale booking sweep failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("stale booking reaper stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use booking_store::{BookingStore, InMemoryBookingStore};
    use chrono::{TimeZone, Utc};
    use common::{HotelId, RoomId, UserId};
    use domain::{BookingStatus, DateRange, NewBooking};
    use saga::OrchestratorConfig;

    use super::*;
    use crate::Services;

    #[tokio::test]
    async fn test_reaper_expires_and_stops() {
        let store = InMemoryBookingStore::new();
        let services = Services::in_memory();
        let orchestrator = BookingOrchestrator::new(
            Arc::new(store.clone()),
            services.catalog,
            services.identity,
            services.payment,
            services.publisher,
            OrchestratorConfig::default(),
        );
        let id = store
            .create_booking(NewBooking {
                user_id: UserId::new(1),
                room_id: RoomId::new(10),
                hotel_id: HotelId::new(5),
                period: DateRange::new(
                    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap(),
                )
                .unwrap(),
            })
            .await
            .unwrap();

        let (tx, rx) = watch::channel(());
        let handle = spawn(
            orchestrator,
            Duration::from_millis(10),
            Duration::ZERO,
            rx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        let booking = store.get_booking(id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Failed);
    }
}
