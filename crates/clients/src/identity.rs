//! Identity (auth service) client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use domain::Recipient;
use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::http;
use crate::metered::observe;

const SERVICE: &str = "identity";

/// Resolves how a hotel owner is addressed in notifications.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Returns the hotelier's display name and notification channel id.
    ///
    /// Returns `ClientError::NotFound` when the user is unknown.
    async fn get_hotelier_information(&self, owner_id: UserId) -> Result<Recipient>;
}

#[derive(Deserialize)]
struct HotelierResponse {
    username: String,
    chat_id: String,
}

/// Identity client over the auth service's HTTP API.
///
/// `GET {base}/users/{owner_id}/hotelier` returns `{"username": ..., "chat_id": ...}`.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    /// Creates a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    #[tracing::instrument(skip(self))]
    async fn get_hotelier_information(&self, owner_id: UserId) -> Result<Recipient> {
        observe(SERVICE, "get_hotelier_information", async {
            let url = http::join(&self.base_url, &format!("/users/{owner_id}/hotelier"));
            let response = self.client.get(&url).send().await?;
            let response = http::expect_found(response, SERVICE, "user", owner_id.as_i64())?;
            let body: HotelierResponse = response.json().await?;

            Ok(Recipient {
                name: body.username,
                chat_id: body.chat_id,
            })
        })
        .await
    }
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    hoteliers: HashMap<UserId, Recipient>,
    lookups: Vec<UserId>,
    fail_on_lookup: bool,
}

/// In-memory identity service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityClient {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryIdentityClient {
    /// Creates an identity service with no registered users.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hotelier.
    pub fn add_hotelier(&self, user_id: UserId, name: &str, chat_id: &str) {
        self.state.write().unwrap().hoteliers.insert(
            user_id,
            Recipient {
                name: name.to_string(),
                chat_id: chat_id.to_string(),
            },
        );
    }

    /// Configures lookups to fail with a transport error.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Users looked up so far, in call order.
    pub fn lookups(&self) -> Vec<UserId> {
        self.state.read().unwrap().lookups.clone()
    }
}

#[async_trait]
impl IdentityClient for InMemoryIdentityClient {
    async fn get_hotelier_information(&self, owner_id: UserId) -> Result<Recipient> {
        let mut state = self.state.write().unwrap();
        state.lookups.push(owner_id);

        if state.fail_on_lookup {
            return Err(ClientError::Transport("identity unavailable".to_string()));
        }

        state
            .hoteliers
            .get(&owner_id)
            .cloned()
            .ok_or(ClientError::NotFound {
                entity: "user",
                id: owner_id.as_i64(),
            })
    }
}
