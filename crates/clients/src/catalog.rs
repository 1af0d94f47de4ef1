//! Hotel/room catalog client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{HotelId, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::http;
use crate::metered::observe;

const SERVICE: &str = "catalog";

/// A room as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub hotel_id: HotelId,
    pub number: i32,
    pub description: String,
    pub base_price: i64,
}

/// Lookups the booking saga needs from the catalog service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists every room of a hotel, in catalog order.
    async fn get_rooms_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Room>>;

    /// Resolves the user that owns a hotel.
    ///
    /// Returns `ClientError::NotFound` when the hotel is not registered.
    async fn get_owner_id_by_hotel_id(&self, hotel_id: HotelId) -> Result<UserId>;
}

#[derive(Deserialize)]
struct OwnerResponse {
    owner_id: UserId,
}

/// Catalog client over the hotel service's HTTP API.
///
/// - `GET {base}/hotels/{hotel_id}/rooms` returns a JSON array of rooms
/// - `GET {base}/hotels/{hotel_id}/owner` returns `{"owner_id": ...}`, 404 when unknown
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Creates a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(skip(self))]
    async fn get_rooms_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Room>> {
        observe(SERVICE, "get_rooms_by_hotel_id", async {
            let url = http::join(&self.base_url, &format!("/hotels/{hotel_id}/rooms"));
            let response = self.client.get(&url).send().await?;
            let response = http::expect_found(response, SERVICE, "hotel", hotel_id.as_i64())?;
            let rooms: Vec<Room> = response.json().await?;

            tracing::debug!(rooms = rooms.len(), "Fetched hotel rooms");
            Ok(rooms)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_owner_id_by_hotel_id(&self, hotel_id: HotelId) -> Result<UserId> {
        observe(SERVICE, "get_owner_id_by_hotel_id", async {
            let url = http::join(&self.base_url, &format!("/hotels/{hotel_id}/owner"));
            let response = self.client.get(&url).send().await?;
            let response = http::expect_found(response, SERVICE, "hotel", hotel_id.as_i64())?;
            let body: OwnerResponse = response.json().await?;
            Ok(body.owner_id)
        })
        .await
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    rooms: HashMap<HotelId, Vec<Room>>,
    owners: HashMap<HotelId, UserId>,
    owner_lookups: Vec<HotelId>,
    fail_on_rooms: bool,
    fail_on_owner: bool,
}

/// In-memory catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogClient {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogClient {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hotel with its owner and rooms.
    pub fn add_hotel(&self, hotel_id: HotelId, owner_id: UserId, rooms: Vec<Room>) {
        let mut state = self.state.write().unwrap();
        state.owners.insert(hotel_id, owner_id);
        state.rooms.insert(hotel_id, rooms);
    }

    /// Configures room listings to fail with a transport error.
    pub fn set_fail_on_rooms(&self, fail: bool) {
        self.state.write().unwrap().fail_on_rooms = fail;
    }

    /// Configures owner lookups to fail with a transport error.
    pub fn set_fail_on_owner(&self, fail: bool) {
        self.state.write().unwrap().fail_on_owner = fail;
    }

    /// Hotels whose owner was looked up, in call order.
    pub fn owner_lookups(&self) -> Vec<HotelId> {
        self.state.read().unwrap().owner_lookups.clone()
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    async fn get_rooms_by_hotel_id(&self, hotel_id: HotelId) -> Result<Vec<Room>> {
        let state = self.state.read().unwrap();

        if state.fail_on_rooms {
            return Err(ClientError::Transport("catalog unavailable".to_string()));
        }

        Ok(state.rooms.get(&hotel_id).cloned().unwrap_or_default())
    }

    async fn get_owner_id_by_hotel_id(&self, hotel_id: HotelId) -> Result<UserId> {
        let mut state = self.state.write().unwrap();
        state.owner_lookups.push(hotel_id);

        if state.fail_on_owner {
            return Err(ClientError::Transport("catalog unavailable".to_string()));
        }

        state
            .owners
            .get(&hotel_id)
            .copied()
            .ok_or(ClientError::NotFound {
                entity: "hotel",
                id: hotel_id.as_i64(),
            })
    }
}
