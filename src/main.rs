//! ==============================================================================
//! main.rs - smartbin host entry point
//! ==============================================================================
//!
//! purpose:
//!     receives pings from the trash bin sensor, keeps them in the event
//!     store and serves the password-protected dashboard.
//!
//! responsibilities:
//!     - resolve configuration (config/smartbin.toml + required env secrets)
//!     - initialize logging
//!     - open the event store (memory, or json file reloaded at startup)
//!     - serve the http surface until ctrl-c / SIGTERM
//!
//! architecture:
//!
//!     ┌────────────┐  GET /registo_lixo   ┌────────────────────────────┐
//!     │ bin sensor │ ───────────────────► │          axum              │
//!     └────────────┘                      │  ingest ─► EventStore ◄─┐  │
//!     ┌────────────┐  GET /historico_lixo │                         │  │
//!     │ dashboard  │ ◄──────────────────► │  history ───────────────┘  │
//!     │ (browser)  │  GET /dashboard      │  auth gate (cookie)        │
//!     └────────────┘                      └────────────────────────────┘
//!
//! ==============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use smartbin_host::auth::AuthGate;
use smartbin_host::config::{AppConfig, ConfigOrigin, Secrets};
use smartbin_host::server::{self, AppState};
use smartbin_host::store::{EventStore, FileStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    let env = |name: &str| std::env::var(name).ok();

    // step 1: configuration; a missing secret stops the process here
    let (config, origin) = AppConfig::from_env(env).context("invalid configuration")?;
    let secrets = Secrets::from_env(env).context("missing dashboard secrets")?;

    // step 2: logging (RUST_LOG wins over the configured level)
    init_logging(&config.logging.level);
    match &origin {
        ConfigOrigin::File(path) => tracing::info!(path = %path.display(), "config loaded"),
        ConfigOrigin::Fallback { path, error } => {
            tracing::warn!(path = %path.display(), %error, "config unusable, using defaults")
        }
        ConfigOrigin::Defaults => tracing::info!("no config file found, using defaults"),
    }
    config.log_summary();

    // step 3: event store
    let options = config.store_options();
    let store: Arc<dyn EventStore> = match &config.store.persist_path {
        Some(path) => {
            let store = FileStore::open(path, options)
                .with_context(|| format!("failed to load history from {}", path.display()))?;
            tracing::info!(events = store.len(), path = %path.display(), "history loaded");
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new(options)),
    };

    // step 4: auth gate
    let auth = AuthGate::new(
        secrets.username,
        secrets.password,
        secrets.session_key,
        config.session_ttl(),
    );

    let state = AppState {
        store,
        auth: Arc::new(auth),
        track_level: options.track_level,
    };

    // step 5: serve until terminated
    run_server(state, config.server.port).await
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// ==============================================================================
// web server
// ==============================================================================

async fn run_server(state: AppState, port: u16) -> Result<()> {
    let app = server::router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("dashboard live at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}
