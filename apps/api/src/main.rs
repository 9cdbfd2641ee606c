use api::{build_router, AppConfig, AppState};
use axum_helpers::{create_production_app, ShutdownCoordinator};
use core_config::FromEnv;
use domain_recipes::MemoryRecipeStore;
use messaging::{ChangeEventRelay, EventBroadcaster, PublisherProvider, StreamPublisherProvider};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const SHUTDOWN_CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();

    let config = AppConfig::from_env()?;
    core_config::tracing::init_tracing(&config.environment);

    let client = redis::Client::open(config.broker.uri.clone())?;
    let redis = ConnectionManager::new(client).await?;
    info!("Connected to broker");

    let publishers: Arc<dyn PublisherProvider> = Arc::new(StreamPublisherProvider::new(
        redis.clone(),
        config.broker.max_stream_length,
    ));
    let broadcaster = EventBroadcaster::new();
    let uploads = Arc::new(uploads::UploadManager::new(Some(config.uploads.clone())).await?);

    let state = AppState {
        store: Arc::new(MemoryRecipeStore::new()),
        publishers: Arc::clone(&publishers),
        uploads,
        broadcaster: Arc::clone(&broadcaster),
    };

    // The relay tails the data-changes stream for as long as the server
    // runs; its shutdown rides the same coordinator broadcast.
    let (coordinator, relay_shutdown) = ShutdownCoordinator::new();
    let relay = ChangeEventRelay::new(redis, Arc::clone(&broadcaster));
    tokio::spawn(relay.run(relay_shutdown));

    let router = build_router(state);

    let cleanup = {
        let coordinator = coordinator.clone();
        async move {
            coordinator.shutdown();
            publishers.close();
            broadcaster.close_all().await;
            info!("Publishers stopped and subscriber streams closed");
        }
    };

    create_production_app(router, &config.server, SHUTDOWN_CLEANUP_TIMEOUT, cleanup).await?;
    Ok(())
}
