//! # Persistent Item
//!
//! A single named value that can be read, written and observed for change,
//! while where it is stored stays pluggable:
//!
//! - **Session scope**: in-memory, lives as long as the process
//! - **Local scope**: a JSON file on disk, survives restarts
//! - **Remote scope**: a key/value service reached over HTTP
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌─────────────────────┐   ┌──────────────────┐
//! │  PersistentItem  │ → │ PersistenceStrategy │ → │   Raw backend    │
//! │ get/set/update/  │   │  SyncStrategy /     │   │ MemoryStore /    │
//! │ clear/subscribe  │   │  AsyncStrategy      │   │ FileStore /      │
//! │    + Notifier    │   │  (codec, validate)  │   │ RemoteStore      │
//! └──────────────────┘   └─────────────────────┘   └──────────────────┘
//! ```
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use persistent_item::config::{StorageConfig, StrategyScope};
//! use persistent_item::item::{ItemOptions, PersistentItem};
//! use persistent_item::strategy::create_strategy;
//!
//! # async fn demo() -> Result<(), persistent_item::error::AppError> {
//! let strategy = Arc::new(create_strategy(StrategyScope::Session, &StorageConfig::default())?);
//! let clicks: PersistentItem<u32> =
//!     PersistentItem::new(ItemOptions::new("clicks", strategy, |_: &u32| true));
//!
//! let subscription = clicks.subscribe(|value| println!("clicks is now {value:?}"));
//! clicks.update(|prev| prev.unwrap_or(0) + 1).await;
//! subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```
//!
//! The crate binary serves the remote key/value protocol ([`api`]).

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod item;
pub mod notifier;
pub mod storage;
pub mod strategy;

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router;
use crate::api::state::AppState;
use crate::config::AppConfig;

pub use item::{ItemOptions, ItemWatch, PersistentItem};
pub use notifier::{Notifier, Subscription};
pub use strategy::{PersistenceStrategy, Strategy};

/// Run the remote key/value service.
///
/// This function:
/// 1. Loads configuration from files and environment
/// 2. Initializes logging and metrics
/// 3. Creates the backing store
/// 4. Starts the HTTP server
/// 5. Handles graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The backing store fails to initialize
/// - HTTP server fails to bind
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting key/value service"
    );

    let metrics = if config.observability.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let state = AppState::from_config(Arc::new(config.clone()), metrics)?;
    info!(backing = %config.server.backing, "Store initialized");

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
