//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::BookingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// Authenticated caller lacks access.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The room is already booked.
    Conflict(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            BookingError::ForbiddenAccess => ApiError::Forbidden(err.to_string()),
            BookingError::HotelNotFound(_) => ApiError::NotFound(err.to_string()),
            BookingError::InvalidInput(msg) => ApiError::BadRequest(msg),
            BookingError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{HotelId, RoomId};

    fn status_of(err: BookingError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_booking_error_status_mapping() {
        assert_eq!(
            status_of(BookingError::Conflict {
                room_id: RoomId::new(1)
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(BookingError::ForbiddenAccess), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(BookingError::HotelNotFound(HotelId::new(7))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BookingError::InvalidInput("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BookingError::Internal("db down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let response = ApiError::Internal("password=hunter2".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }
}
