use carlot::application::NotifyingCarStore;
use carlot::config::Config;
use carlot::domain::car::{CarEventPublisher, CarStore};
use carlot::domain::dealer::DealerStore;
use carlot::infrastructure::messaging::{AmqpTransport, BrokerPublisher};
use carlot::interface::api::{build_router, init_metrics, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "postgres")]
use carlot::infrastructure::persistence::{
    create_pool, run_migrations, DatabaseConfig, PgCarStore, PgDealerStore,
};
#[cfg(not(feature = "postgres"))]
use carlot::infrastructure::persistence::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Carlot");

    let config = Config::from_env()?;
    info!("Configuration loaded: broker {:?}", config.broker);

    #[cfg(feature = "postgres")]
    let (car_store, dealer_store): (Arc<dyn CarStore>, Arc<dyn DealerStore>) = {
        info!("Initializing database connection...");
        let pool = create_pool(&DatabaseConfig::from(&config.database)).await?;

        info!("Running database migrations...");
        run_migrations(&pool).await?;
        info!("Database migrations completed");

        (
            Arc::new(PgCarStore::new(pool.clone())),
            Arc::new(PgDealerStore::new(pool)),
        )
    };

    #[cfg(not(feature = "postgres"))]
    let (car_store, dealer_store): (Arc<dyn CarStore>, Arc<dyn DealerStore>) = {
        info!("Using in-memory store (postgres feature disabled)");
        let store = InMemoryStore::new();
        (Arc::new(store.clone()), Arc::new(store))
    };

    // Broker outages are tolerated; init only logs on failure.
    let publisher = Arc::new(BrokerPublisher::new(
        config.broker.clone(),
        Arc::new(AmqpTransport::new()),
    ));
    publisher.init().await;

    let cars = Arc::new(NotifyingCarStore::new(
        car_store,
        publisher.clone() as Arc<dyn CarEventPublisher>,
    ));
    let state = AppState::new(cars, dealer_store);

    let prometheus_handle = init_metrics()?;
    let app = build_router(state, prometheus_handle);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    publisher.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
