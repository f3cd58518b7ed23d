pub mod accounts; // Admin provisioning and login
pub mod api; // HTTP surface: public form + admin API
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod intake; // Public form flow
pub mod models;
pub mod records;
pub mod sweeper; // Background token expiry
pub mod tokens; // Link token lifecycle
pub mod validation;
pub mod vault; // Standalone encrypted local client

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;
use crate::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database unavailable: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Run the HTTP service until Ctrl-C.
pub async fn run_server(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!("MedIntake starting v{}", config::APP_VERSION);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development secret");
    }

    let addr = config.listen_addr;
    let core = Arc::new(CoreState::initialize(config)?);

    // Seeding problems never stop the service.
    match core.open_db() {
        Ok(conn) => {
            if let Err(e) = accounts::seed_default_admin(&conn, &core.config, core.now()) {
                tracing::error!(error = %e, "Default admin seeding failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Default admin seeding skipped"),
    }

    let sweeper = sweeper::start_sweeper(core.clone(), core.config.sweep_interval_secs);
    let server = api::start_api_server(core, addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!(addr = %server.local_addr(), "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
    tracing::info!("Shutting down");

    server.shutdown().await;
    if let Some(sweeper) = sweeper {
        sweeper.stop().await;
    }
    Ok(())
}
