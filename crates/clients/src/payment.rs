//! Payment gateway client.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::PaymentRequest;
use reqwest::StatusCode;

use crate::error::{ClientError, Result};
use crate::http;
use crate::metered::observe;

const SERVICE: &str = "payment";

/// Hands a payment off to the asynchronous payment processor.
///
/// A successful dispatch only means the processor accepted the request; the
/// outcome arrives later on the webhook carried in [`PaymentRequest::web_hook_url`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn dispatch(&self, request: &PaymentRequest) -> Result<()>;
}

/// Payment gateway over HTTP.
///
/// Posts the JSON request to the configured endpoint and accepts only `202 Accepted`.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway posting to `endpoint`, bounded by its own timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(
        skip(self, request),
        fields(booking_id = %request.meta_data.booking_id, amount = request.amount)
    )]
    async fn dispatch(&self, request: &PaymentRequest) -> Result<()> {
        observe(SERVICE, "dispatch", async {
            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    tracing::debug!("Payment accepted by gateway");
                    Ok(())
                }
                status => {
                    tracing::warn!(status = status.as_u16(), "Payment gateway rejected request");
                    Err(ClientError::UnexpectedStatus {
                        service: SERVICE,
                        status: status.as_u16(),
                    })
                }
            }
        })
        .await
    }
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    dispatched: Vec<PaymentRequest>,
    fail_on_dispatch: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to reject dispatches.
    pub fn set_fail_on_dispatch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_dispatch = fail;
    }

    /// Returns the number of accepted dispatches.
    pub fn dispatch_count(&self) -> usize {
        self.state.read().unwrap().dispatched.len()
    }

    /// Returns the accepted requests, in dispatch order.
    pub fn dispatched(&self) -> Vec<PaymentRequest> {
        self.state.read().unwrap().dispatched.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn dispatch(&self, request: &PaymentRequest) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_dispatch {
            return Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: 503,
            });
        }

        state.dispatched.push(request.clone());
        Ok(())
    }
}
