//! # synthetixd — synthetix device broker daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool, run migrations and seed records
//! - Register driver types and build the device manager and notification hub
//! - Build the axum router, injecting the command service
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT), then unload every device
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use synthetix_adapter_http_axum::state::AppState;
use synthetix_app::device_manager::DeviceManager;
use synthetix_app::notification_hub::NotificationHub;
use synthetix_app::registry::DriverRegistry;
use synthetix_app::services::command_service::CommandService;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("load configuration")?;
    init_tracing(&config.logging.filter)?;

    // Database
    let db = synthetix_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("open database")?;
    let store = db.record_store();

    for seed in &config.devices {
        let record = seed.to_record()?;
        store
            .upsert_record(&record)
            .await
            .with_context(|| format!("seed device `{}`", record.device_id))?;
    }
    tracing::info!(devices = config.devices.len(), "device records seeded");

    let known = store.list_records().await.context("list device records")?;
    for record in &known {
        tracing::debug!(
            device_id = %record.device_id,
            device_type = record.device_type.as_deref().unwrap_or("<default>"),
            "device record on file"
        );
    }
    tracing::info!(records = known.len(), "device records on file");

    // Drivers
    let mut registry = DriverRegistry::new();
    synthetix_adapter_virtual::register(&mut registry);
    if !registry.contains(&config.broker.default_driver_type) {
        tracing::warn!(
            driver_type = %config.broker.default_driver_type,
            "default driver type is not registered"
        );
    }

    // Core
    let manager = Arc::new(DeviceManager::new(Arc::new(registry)));
    let hub = Arc::new(NotificationHub::new(config.send_timeout()));
    let service = Arc::new(
        CommandService::new(Arc::clone(&manager), hub, store)
            .with_default_driver_type(config.broker.default_driver_type.clone()),
    );

    // HTTP
    let app = synthetix_adapter_http_axum::router::build(AppState::from_arc(service));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "synthetixd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;

    tracing::info!(devices = manager.len(), "shutting down, unloading devices");
    manager.unload_all().await;

    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).context("parse logging filter")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("install tracing subscriber")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
