use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use domain::{Booking, BookingStatus, Channel, DateRange, NewBooking, StatusTransition};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{BookingStore, StatusUpdate, observe},
};

const BOOKING_COLUMNS: &str = "id, user_id, room_id, hotel_id, status, start_date, end_date, \
    created_at, guest_notified_at, hotelier_notified_at";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let status: String = row.try_get("status")?;

        Ok(Booking {
            id: BookingId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            room_id: RoomId::new(row.try_get("room_id")?),
            hotel_id: HotelId::new(row.try_get("hotel_id")?),
            status: status.parse()?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
            guest_notified_at: row.try_get("guest_notified_at")?,
            hotelier_notified_at: row.try_get("hotelier_notified_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[tracing::instrument(skip(self))]
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingId> {
        observe("create_booking", async {
            let mut tx = self.pool.begin().await?;

            // Must be the first statement of the transaction.
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await?;

            let conflicting: Option<i64> = sqlx::query_scalar(
                r#"
                SELECT id
                FROM bookings
                WHERE room_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND start_date < $3
                  AND end_date > $2
                LIMIT 1
                "#,
            )
            .bind(booking.room_id.as_i64())
            .bind(booking.period.start())
            .bind(booking.period.end())
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(existing) = conflicting {
                tracing::debug!(existing, "overlapping booking found");
                tx.rollback().await?;
                return Err(StoreError::BookingAlreadyExists {
                    room_id: booking.room_id,
                    period: booking.period,
                });
            }

            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO bookings (user_id, room_id, hotel_id, status, start_date, end_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(booking.user_id.as_i64())
            .bind(booking.room_id.as_i64())
            .bind(booking.hotel_id.as_i64())
            .bind(BookingStatus::Pending.as_str())
            .bind(booking.period.start())
            .bind(booking.period.end())
            .fetch_one(&mut *tx)
            .await?;

            // A lost serialization race surfaces here as SQLSTATE 40001.
            tx.commit().await?;
            Ok(BookingId::new(id))
        })
        .await
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        observe("get_booking", async {
            let row = sqlx::query(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
            ))
            .bind(booking_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

            row.map(Self::row_to_booking).transpose()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_bookings_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>> {
        observe("get_bookings_by_user_id", async {
            let rows = sqlx::query(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY id ASC"
            ))
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(Self::row_to_booking).collect()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_bookings_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Booking>> {
        observe("get_bookings_by_hotel_id", async {
            let rows = sqlx::query(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE hotel_id = $1 ORDER BY id ASC"
            ))
            .bind(hotel_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(Self::row_to_booking).collect()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_unavailable_room_ids(
        &self,
        hotel_id: HotelId,
        period: DateRange,
    ) -> Result<HashSet<RoomId>> {
        observe("get_unavailable_room_ids", async {
            let room_ids: Vec<i64> = sqlx::query_scalar(
                r#"
                SELECT DISTINCT room_id
                FROM bookings
                WHERE hotel_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND start_date < $3
                  AND end_date > $2
                "#,
            )
            .bind(hotel_id.as_i64())
            .bind(period.start())
            .bind(period.end())
            .fetch_all(&self.pool)
            .await?;

            Ok(room_ids.into_iter().map(RoomId::new).collect())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<StatusUpdate> {
        observe("update_booking_status", async {
            let mut tx = self.pool.begin().await?;

            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1 FOR UPDATE")
                    .bind(booking_id.as_i64())
                    .fetch_optional(&mut *tx)
                    .await?;

            let current: BookingStatus = current
                .ok_or(StoreError::NotFound(booking_id))?
                .parse()?;

            let transition = current
                .transition_to(status)
                .map_err(|source| StoreError::InvalidTransition { booking_id, source })?;

            if transition == StatusTransition::Unchanged {
                tx.rollback().await?;
                return Ok(StatusUpdate::Unchanged);
            }

            sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(booking_id.as_i64())
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(StatusUpdate::Applied)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn mark_notified(&self, booking_id: BookingId, channel: Channel) -> Result<()> {
        observe("mark_notified", async {
            let statement = match channel {
                Channel::Guest => {
                    "UPDATE bookings SET guest_notified_at = COALESCE(guest_notified_at, NOW()) \
                     WHERE id = $1"
                }
                Channel::Hotelier => {
                    "UPDATE bookings SET hotelier_notified_at = COALESCE(hotelier_notified_at, NOW()) \
                     WHERE id = $1"
                }
            };

            let result = sqlx::query(statement)
                .bind(booking_id.as_i64())
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(booking_id));
            }
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn expire_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<BookingId>> {
        observe("expire_pending", async {
            let ids: Vec<i64> = sqlx::query_scalar(
                r#"
                UPDATE bookings
                SET status = 'failed', updated_at = NOW()
                WHERE status = 'pending' AND created_at < $1
                RETURNING id
                "#,
            )
            .bind(created_before)
            .fetch_all(&self.pool)
            .await?;

            Ok(ids.into_iter().map(BookingId::new).collect())
        })
        .await
    }
}
