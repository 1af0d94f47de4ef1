//! HTTP API server with observability for the room-booking service.
//!
//! Provides the booking REST endpoints and the payment webhook, with bearer
//! authentication, structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod reaper;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use booking_store::BookingStore;
use clients::{
    CatalogClient, EventPublisher, IdentityClient, InMemoryCatalogClient, InMemoryEventPublisher,
    InMemoryIdentityClient, InMemoryPaymentGateway, PaymentGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{BookingOrchestrator, OrchestratorConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::JwtVerifier;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: BookingOrchestrator,
    pub jwt: Arc<JwtVerifier>,
}

impl FromRef<Arc<AppState>> for Arc<JwtVerifier> {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.jwt.clone()
    }
}

/// Remote collaborators of the orchestrator.
pub struct Services {
    pub catalog: Arc<dyn CatalogClient>,
    pub identity: Arc<dyn IdentityClient>,
    pub payment: Arc<dyn PaymentGateway>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl Services {
    /// In-memory services for local runs and tests.
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalogClient::new()),
            identity: Arc::new(InMemoryIdentityClient::new()),
            payment: Arc::new(InMemoryPaymentGateway::new()),
            publisher: Arc::new(InMemoryEventPublisher::new()),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bookings", post(routes::bookings::create))
        .route("/bookings/users", get(routes::bookings::list_by_user))
        .route("/bookings/hotels", get(routes::bookings::list_by_hotel))
        .route("/bookings/hotels/rooms", get(routes::bookings::available_rooms))
        .route(
            domain::payment::WEBHOOK_PATH,
            post(routes::bookings::payment_webhook),
        )
        .with_state(state)
        .merge(routes::metrics::router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the orchestrator over a store and its remote services.
pub fn create_state(
    store: Arc<dyn BookingStore>,
    services: Services,
    orchestrator_config: OrchestratorConfig,
    jwt_secret: &str,
) -> Arc<AppState> {
    let orchestrator = BookingOrchestrator::new(
        store,
        services.catalog,
        services.identity,
        services.payment,
        services.publisher,
        orchestrator_config,
    );

    Arc::new(AppState {
        orchestrator,
        jwt: Arc::new(JwtVerifier::new(jwt_secret)),
    })
}
