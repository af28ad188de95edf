use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;

use tour_roster::config::{Config, DatabaseBackend, DatabaseConfig, PushConfig};
use tour_roster::notifications::{ExpoChannel, LogChannel, Notifier};
use tour_roster::publish::PublishService;
use tour_roster::server::RosterServer;
use tour_roster::storage::{MemoryRosterStore, PgRosterStore, SharedRosterStore};

/// Open the configured store
pub async fn open_store(database: &DatabaseConfig) -> Result<SharedRosterStore> {
    match database.backend {
        DatabaseBackend::Postgres => {
            let store = PgRosterStore::connect(database).context("Failed to create connection pool")?;
            store.ping().await.context("Failed to reach PostgreSQL")?;

            let (size, available, max_size) = store.pool_status();
            tracing::info!(size, available, max_size, "Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory demo store, nothing is persisted");
            Ok(Arc::new(MemoryRosterStore::demo(Local::now().date_naive())))
        }
    }
}

/// Notifier for the configured push settings
pub fn build_notifier(push: &PushConfig) -> Result<Notifier> {
    if !push.enabled {
        tracing::info!("Push notifications disabled, messages will only be logged");
        return Ok(Notifier::new(Arc::new(LogChannel), push.batch_size));
    }

    let channel = ExpoChannel::new(push.expo_config()).context("Failed to create push channel")?;
    tracing::info!(endpoint = channel.endpoint(), batch_size = push.batch_size, "Push channel ready");
    Ok(Notifier::new(Arc::new(channel), push.batch_size))
}

/// Store, notifier and roster rules wired together
pub async fn build_service(config: &Config) -> Result<PublishService> {
    let store = open_store(&config.database).await?;
    let notifier = build_notifier(&config.push)?;
    Ok(PublishService::from_config(store, notifier, &config.roster))
}

/// Start the HTTP API
pub async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(bind) = bind {
        server_config.bind_address = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;
    }

    let service = build_service(&config).await?;
    let server = RosterServer::new(server_config, service)?;

    println!("{}", server.info().display());
    println!();

    server.start_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
