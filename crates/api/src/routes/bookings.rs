//! Booking endpoints and the payment webhook.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use clients::Room;
use common::{BookingId, HotelId, UserId};
use domain::{Booking, BookingRequest, DateRange, Disposition, PaymentResponse};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{Guest, Hotelier};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct HotelQuery {
    pub hotel_id: HotelId,
}

#[derive(Debug, Deserialize)]
pub struct RoomsQuery {
    pub hotel_id: HotelId,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub booking_id: Option<BookingId>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub booking_id: BookingId,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub result: &'static str,
}

fn bad_request(rejection: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(rejection.to_string())
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("invalid {field}: {e}")))
}

/// POST /bookings — reserve a room and start the payment.
#[tracing::instrument(skip(state, guest, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Guest(guest): Guest,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), ApiError> {
    let Json(request) = body.map_err(bad_request)?;
    let booking_id = state.orchestrator.create_booking(&request, &guest).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse { booking_id }),
    ))
}

/// GET /bookings/users?user_id= — the caller's own bookings.
#[tracing::instrument(skip(state, guest))]
pub async fn list_by_user(
    State(state): State<Arc<AppState>>,
    Guest(guest): Guest,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let bookings = state
        .orchestrator
        .get_bookings_by_user_id(&guest, query.user_id)
        .await?;
    Ok(Json(bookings))
}

/// GET /bookings/hotels?hotel_id= — bookings of a hotel the caller owns.
#[tracing::instrument(skip(state, hotelier))]
pub async fn list_by_hotel(
    State(state): State<Arc<AppState>>,
    Hotelier(hotelier): Hotelier,
    query: Result<Query<HotelQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let bookings = state
        .orchestrator
        .get_bookings_by_hotel_id(&hotelier, query.hotel_id)
        .await?;
    Ok(Json(bookings))
}

/// GET /bookings/hotels/rooms?hotel_id=&start_date=&end_date= — rooms free for the period.
#[tracing::instrument(skip(state))]
pub async fn available_rooms(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RoomsQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let start = parse_timestamp("start_date", &query.start_date)?;
    let end = parse_timestamp("end_date", &query.end_date)?;
    let period = DateRange::new(start, end).map_err(bad_request)?;

    let rooms = state
        .orchestrator
        .get_available_rooms(query.hotel_id, period)
        .await?;
    Ok(Json(rooms))
}

/// POST /bookings/payment/response?booking_id= — payment gateway callback.
#[tracing::instrument(skip(state, body))]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WebhookQuery>, QueryRejection>,
    body: Result<Json<PaymentResponse>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let Json(response) = body.map_err(bad_request)?;

    let disposition = state
        .orchestrator
        .handle_payment_webhook(query.booking_id, response)
        .await?;

    let result = match disposition {
        Disposition::Transition => "applied",
        Disposition::Resumed => "resumed",
        Disposition::Duplicate => "duplicate",
        Disposition::Contradicting => "ignored",
    };
    Ok(Json(WebhookResponse { result }))
}
