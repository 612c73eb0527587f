use axum::{routing::get, Router};
use event_bus::{EventBus, InMemoryBus, NatsBus};
use risk::config::Config;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("invalid configuration");

    tracing::info!("connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let bus: Arc<dyn EventBus> = match config.bus_type.to_lowercase().as_str() {
        "nats" => {
            tracing::info!(nats_url = %config.nats_url, "connecting to NATS");
            let client = async_nats::connect(&config.nats_url)
                .await
                .expect("failed to connect to NATS");
            Arc::new(NatsBus::new(client))
        }
        _ => {
            tracing::info!("using in-memory event bus");
            Arc::new(InMemoryBus::new())
        }
    };

    let publisher_pool = pool.clone();
    let publisher_bus = bus.clone();
    tokio::spawn(async move {
        saga_contracts::runtime::outbox::run_publisher(publisher_pool, publisher_bus).await;
    });

    risk::consumer::start(bus.clone(), pool.clone()).await;

    let app = Router::new().route("/health", get(health));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "risk module listening");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind");
    axum::serve(listener, app).await.expect("server failed to start");
}
