//! Armory Engine - Main entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use armory_domain::UserId;
use armory_engine::infrastructure::bot_api::BotApiClient;
use armory_engine::infrastructure::persistence::{
    FileAssetStore, FileReferenceCatalog, JsonCatalogStore,
};
use armory_engine::infrastructure::ports::{ChatPort, EventSource};
use armory_engine::infrastructure::restart_marker::RestartMarker;
use armory_engine::{render, App, AppConfig, DispatchOutcome, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from the working directory, if a .env file exists.
    dotenvy::dotenv().ok();

    let log_file = std::env::var("ARMORY_LOG_FILE").ok().map(PathBuf::from);
    init_tracing(log_file.as_deref());

    tracing::info!("Starting Armory Engine");

    // Load configuration
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "database".into()));
    let images_dir = PathBuf::from(std::env::var("IMAGES_DIR").unwrap_or_else(|_| "images".into()));
    let marker_path = std::env::var("RESTART_MARKER_FILE")
        .unwrap_or_else(|_| "restart_message.txt".into());
    let update_cmd = std::env::var("ARMORY_UPDATE_CMD").ok();
    let allowed_users: Vec<UserId> = std::env::var("ALLOWED_USERS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .map(UserId::new)
        .collect();
    if allowed_users.is_empty() {
        tracing::warn!("ALLOWED_USERS is empty; all privileged commands will be denied");
    }

    let config = AppConfig::new(allowed_users)
        .with_log_file(log_file)
        .with_update_cmd(update_cmd);

    // Create infrastructure adapters
    let client = BotApiClient::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let catalog = Arc::new(JsonCatalogStore::new(data_dir.join("builds.json")));
    let reference = Arc::new(FileReferenceCatalog::new(&data_dir));
    let assets = Arc::new(FileAssetStore::new(&images_dir));
    let chat = Arc::new(client.clone());
    let restart_marker = RestartMarker::new(&marker_path);

    // One-shot restarted confirmation for the operator who asked for it.
    if let Some(user) = restart_marker.consume().await {
        let is_admin = config.is_allowed(user);
        let result = chat
            .send_text(
                user,
                "Bot restarted successfully. Back to the main menu...",
                Some(&render::main_menu(is_admin)),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!("Failed to deliver restart confirmation: {e}");
        }
    }

    // Create application
    let app = Arc::new(App::new(
        config,
        catalog,
        reference,
        assets,
        chat,
        restart_marker,
    ));
    let dispatcher = Dispatcher::new(app);

    tracing::info!("Polling for events");
    loop {
        match client.next_batch().await {
            Ok(events) => {
                // Arrival order within the batch is the per-user ordering
                // guarantee, so events are handled sequentially.
                for envelope in events {
                    if dispatcher.dispatch(envelope).await == DispatchOutcome::Shutdown {
                        tracing::info!("Shutdown requested by operator");
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Polling failed: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Stdout logging, plus an append-only file layer when a log file is
/// configured (the same file backs the `log` command).
fn init_tracing(log_file: Option<&std::path::Path>) {
    let file_layer = log_file.and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Could not open log file {}: {e}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "armory_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}
