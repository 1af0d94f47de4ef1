//! Payment gateway wire contracts.

use common::BookingId;
use serde::{Deserialize, Serialize};

use crate::{BookingMessage, BookingStatus};

/// Path on this service that the payment gateway calls back.
pub const WEBHOOK_PATH: &str = "/bookings/payment/response";

/// Builds the callback URL for a booking: `{base}/bookings/payment/response?booking_id={id}`.
pub fn webhook_url(base_url: &str, booking_id: BookingId) -> String {
    format!(
        "{}{}?booking_id={}",
        base_url.trim_end_matches('/'),
        WEBHOOK_PATH,
        booking_id
    )
}

/// Terminal outcome reported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    /// The gateway reports `"fail"`, or `"failed"` when its own processing times out.
    #[serde(alias = "failed")]
    Fail,
}

impl PaymentStatus {
    /// The booking status this outcome settles on.
    pub fn booking_status(&self) -> BookingStatus {
        match self {
            PaymentStatus::Success => BookingStatus::Confirmed,
            PaymentStatus::Fail => BookingStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request dispatched to the payment gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub card_number: String,
    pub amount: i64,
    pub web_hook_url: String,
    pub meta_data: BookingMessage,
}

impl PaymentRequest {
    /// Builds a request whose callback URL embeds the message's booking id.
    pub fn new(
        meta_data: BookingMessage,
        card_number: impl Into<String>,
        amount: i64,
        webhook_base_url: &str,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            amount,
            web_hook_url: webhook_url(webhook_base_url, meta_data.booking_id),
            meta_data,
        }
    }
}

impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("card_number", &"<redacted>")
            .field("amount", &self.amount)
            .field("web_hook_url", &self.web_hook_url)
            .field("meta_data", &self.meta_data)
            .finish()
    }
}

/// Callback body posted by the payment gateway to the webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub status: PaymentStatus,
    pub meta_data: BookingMessage,
}
