//! cpm-gate - Car Park Manager gate service
//!
//! Single-process local tool: vehicles enter and leave through this
//! service, plates are read via OCR, tickets live in a local SQLite
//! database, and fees are computed from elapsed time with late-departure
//! surcharges.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use cpm_common::config;
use cpm_common::db::init_database;
use cpm_gate::db::VehicleStore;
use cpm_gate::foreground::{spawn_foreground, GateView};
use cpm_gate::scanner::TesseractScanner;
use cpm_gate::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting CPM Gate (cpm-gate) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Root folder resolution: CLI arg > env var > config file > default
    let cli_root = std::env::args().nth(1);
    let root_folder = config::resolve_root_folder(cli_root.as_deref());
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    let store = Arc::new(VehicleStore::open(pool).await?);
    info!("✓ Vehicle store ready ({} vehicles parked)", store.find_all().await.len());

    // Foreground event loop: the single writer of presentation state
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let view = Arc::new(RwLock::new(GateView::default()));
    spawn_foreground(event_rx, Arc::clone(&view));

    let scanner = Arc::new(TesseractScanner::default());
    let state = AppState::new(store, scanner, event_tx, view);
    let app = build_router(state);

    // Local tool: bind loopback only
    let listener = tokio::net::TcpListener::bind("127.0.0.1:5780").await?;
    info!("cpm-gate listening on http://127.0.0.1:5780");
    info!("Health check: http://127.0.0.1:5780/health");

    axum::serve(listener, app).await?;

    Ok(())
}
