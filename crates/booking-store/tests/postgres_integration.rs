//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p booking-store --test postgres_integration -- --test-threads=1
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use booking_store::{BookingStore, PostgresBookingStore, StatusUpdate, StoreError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use domain::{BookingStatus, Channel, DateRange, Deliveries, NewBooking};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            let store = PostgresBookingStore::new(temp_pool);

            store.run_migrations().await.unwrap();
            // Applying the same migrations again is a no-op.
            store.run_migrations().await.unwrap();

            store.pool().close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty bookings table
async fn get_test_store() -> PostgresBookingStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(16)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bookings RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresBookingStore::new(pool)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, d, 0, 0, 0).unwrap()
}

fn new_booking(user: i64, room: i64, hotel: i64, start: u32, end: u32) -> NewBooking {
    NewBooking {
        user_id: UserId::new(user),
        room_id: RoomId::new(room),
        hotel_id: HotelId::new(hotel),
        period: DateRange::new(day(start), day(end)).unwrap(),
    }
}

#[tokio::test]
#[serial]
async fn create_and_load_booking() {
    let store = get_test_store().await;

    let id = store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();

    let booking = store.get_booking(id).await.unwrap().unwrap();
    assert_eq!(booking.id, id);
    assert_eq!(booking.room_id, RoomId::new(10));
    assert_eq!(booking.hotel_id, HotelId::new(5));
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.start_date, day(1));
    assert_eq!(booking.end_date, day(3));
}

#[tokio::test]
#[serial]
async fn overlapping_booking_is_rejected() {
    let store = get_test_store().await;
    store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();

    let result = store.create_booking(new_booking(2, 10, 5, 2, 4)).await;
    assert!(matches!(result, Err(StoreError::BookingAlreadyExists { .. })));

    let adjacent = store.create_booking(new_booking(2, 10, 5, 3, 5)).await;
    assert!(adjacent.is_ok());
}

#[tokio::test]
#[serial]
async fn failed_booking_does_not_block_room() {
    let store = get_test_store().await;
    let id = store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();
    store
        .update_booking_status(id, BookingStatus::Failed)
        .await
        .unwrap();

    assert!(store
        .create_booking(new_booking(2, 10, 5, 1, 3))
        .await
        .is_ok());
}

#[tokio::test]
#[serial]
async fn concurrent_overlapping_creates_never_double_book() {
    let store = get_test_store().await;

    let mut handles = Vec::new();
    for i in 0..12i64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let start = 1 + (i % 3) as u32;
            store.create_booking(new_booking(i, 10, 5, start, start + 3)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::BookingAlreadyExists { .. }) => {}
            Err(err) => assert!(err.is_retryable(), "unexpected error: {err}"),
        }
    }
    assert_eq!(created, 1);

    let bookings = store
        .get_bookings_by_hotel_id(HotelId::new(5))
        .await
        .unwrap();
    let active: Vec<_> = bookings.iter().filter(|b| b.holds_room()).collect();
    for (i, a) in active.iter().enumerate() {
        for b in active.iter().skip(i + 1) {
            assert!(!a.period().overlaps(&b.period()));
        }
    }
}

#[tokio::test]
#[serial]
async fn listings_by_user_and_hotel() {
    let store = get_test_store().await;
    store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();
    store
        .create_booking(new_booking(1, 20, 6, 1, 3))
        .await
        .unwrap();
    store
        .create_booking(new_booking(2, 11, 5, 1, 3))
        .await
        .unwrap();

    let by_user = store.get_bookings_by_user_id(UserId::new(1)).await.unwrap();
    assert_eq!(by_user.len(), 2);

    let by_hotel = store
        .get_bookings_by_hotel_id(HotelId::new(5))
        .await
        .unwrap();
    assert_eq!(by_hotel.len(), 2);

    let none = store.get_bookings_by_user_id(UserId::new(99)).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[serial]
async fn unavailable_rooms_use_half_open_overlap() {
    let store = get_test_store().await;
    store
        .create_booking(new_booking(1, 1, 7, 1, 3))
        .await
        .unwrap();
    store
        .create_booking(new_booking(1, 2, 7, 3, 6))
        .await
        .unwrap();
    store
        .create_booking(new_booking(1, 3, 8, 3, 6))
        .await
        .unwrap();

    let period = DateRange::new(day(3), day(4)).unwrap();
    let unavailable = store
        .get_unavailable_room_ids(HotelId::new(7), period)
        .await
        .unwrap();
    assert_eq!(unavailable, HashSet::from([RoomId::new(2)]));
}

#[tokio::test]
#[serial]
async fn status_update_is_idempotent_and_guards_terminal_states() {
    let store = get_test_store().await;
    let id = store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();

    assert_eq!(
        store
            .update_booking_status(id, BookingStatus::Confirmed)
            .await
            .unwrap(),
        StatusUpdate::Applied
    );
    assert_eq!(
        store
            .update_booking_status(id, BookingStatus::Confirmed)
            .await
            .unwrap(),
        StatusUpdate::Unchanged
    );
    assert!(matches!(
        store.update_booking_status(id, BookingStatus::Failed).await,
        Err(StoreError::InvalidTransition { .. })
    ));
    assert!(matches!(
        store
            .update_booking_status(BookingId::new(404), BookingStatus::Confirmed)
            .await,
        Err(StoreError::NotFound(_))
    ));

    let booking = store.get_booking(id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
#[serial]
async fn expire_pending_fails_stale_rows() {
    let store = get_test_store().await;
    let stale = store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();
    let confirmed = store
        .create_booking(new_booking(1, 11, 5, 1, 3))
        .await
        .unwrap();
    store
        .update_booking_status(confirmed, BookingStatus::Confirmed)
        .await
        .unwrap();

    let expired = store
        .expire_pending(Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(expired, vec![stale]);

    let booking = store.get_booking(stale).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Failed);
}

#[tokio::test]
#[serial]
async fn notification_markers_are_set_once_per_channel() {
    let store = get_test_store().await;
    let id = store
        .create_booking(new_booking(1, 10, 5, 1, 3))
        .await
        .unwrap();
    store
        .update_booking_status(id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let booking = store.get_booking(id).await.unwrap().unwrap();
    assert_eq!(booking.deliveries(), Deliveries::NONE);

    store.mark_notified(id, Channel::Guest).await.unwrap();
    let first = store.get_booking(id).await.unwrap().unwrap();
    assert_eq!(
        first.deliveries(),
        Deliveries {
            guest: true,
            hotelier: false,
        }
    );

    store.mark_notified(id, Channel::Guest).await.unwrap();
    store.mark_notified(id, Channel::Hotelier).await.unwrap();
    let both = store.get_booking(id).await.unwrap().unwrap();
    assert_eq!(both.guest_notified_at, first.guest_notified_at);
    assert!(both.hotelier_notified_at.is_some());

    assert!(matches!(
        store
            .mark_notified(BookingId::new(404), Channel::Guest)
            .await,
        Err(StoreError::NotFound(_))
    ));
}
