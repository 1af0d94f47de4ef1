//! API server entry point.

use std::sync::Arc;

use booking_store::PostgresBookingStore;
use clients::{HttpCatalogClient, HttpIdentityClient, HttpPaymentGateway, KafkaEventPublisher};
use saga::OrchestratorConfig;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::{Config, LogFormat};
use api::{Services, reaper};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("invalid configuration");

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect to PostgreSQL and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    let store = PostgresBookingStore::new(pool.clone());
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");

    // 4. Remote services
    let services = Services {
        catalog: Arc::new(
            HttpCatalogClient::new(&config.hotel_service_url, config.request_timeout)
                .expect("failed to build catalog client"),
        ),
        identity: Arc::new(
            HttpIdentityClient::new(&config.auth_service_url, config.request_timeout)
                .expect("failed to build identity client"),
        ),
        payment: Arc::new(
            HttpPaymentGateway::new(&config.payment_service_url, config.payment_timeout)
                .expect("failed to build payment gateway client"),
        ),
        publisher: Arc::new(
            KafkaEventPublisher::new(
                &config.kafka_broker,
                &config.kafka_topic_client,
                &config.kafka_topic_hotel,
                config.request_timeout,
            )
            .expect("failed to create Kafka producer"),
        ),
    };

    // 5. Build the application
    let state = api::create_state(
        Arc::new(store),
        services,
        OrchestratorConfig {
            webhook_base_url: config.webhook_base_url.clone(),
            webhook_timeout: config.webhook_timeout,
        },
        &config.jwt_secret,
    );
    let (reaper_tx, reaper_rx) = watch::channel(());
    let reaper = reaper::spawn(
        state.orchestrator.clone(),
        config.reaper_interval,
        config.pending_booking_ttl,
        reaper_rx,
    );
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Drain background work, then release the pool
    let _ = reaper_tx.send(());
    if let Err(err) = reaper.await {
        tracing::warn!(error = %err, "reaper task ended abnormally");
    }
    pool.close().await;

    tracing::info!("server shut down gracefully");
}
