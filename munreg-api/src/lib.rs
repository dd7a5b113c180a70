//! # MUNREG API Server
//!
//! REST API for conference registrations, consumed by the public registration
//! form and the admin dashboard.
//!
//! ## Endpoints
//!
//! - `POST /api/registrations` - Submit a registration
//! - `GET /api/registrations` - List, search (`search`) or filter (`experience`, `committee`)
//! - `GET /api/registrations/:id` - Fetch one registration
//! - `PATCH /api/registrations/:id` - Partial update, e.g. `{"status":"confirmed"}`
//! - `DELETE /api/registrations/:id` - Remove a registration
//! - `GET /api/stats` - Dashboard counters
//! - `GET /api/export` - CSV download, same parameters as the list endpoint
//! - `GET /api/committees` - Committee catalog
//! - `GET /health` - Liveness probe
//!
//! ## Example
//!
//! ```rust,ignore
//! use munreg_api::{ApiServer, ApiConfig};
//!
//! let config = ApiConfig::default();
//! let server = ApiServer::new(config);
//! server.run(([0, 0, 0, 0], 5000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod logging;
mod routes;
mod state;

pub use error::ApiError;
pub use logging::format_log_line;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use munreg_core::constants::MAX_BODY_BYTES;
use munreg_core::traits::RegistrationStore;
use munreg_storage::FileStore;

/// API server for MUNREG.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server backed by a fresh in-memory store.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ApiConfig, store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            state: Arc::new(AppState::with_store(config, store)),
        }
    }

    /// Creates a server, loading the snapshot file when `data_file` is set.
    pub async fn open(config: ApiConfig) -> munreg_core::Result<Self> {
        match config.data_file.clone() {
            Some(path) => {
                let store = FileStore::new(&path).await?;
                info!(path = %path.display(), registrations = store.len(), "Opened data file");
                Ok(Self::with_store(config, Arc::new(store)))
            }
            None => Ok(Self::new(config)),
        }
    }

    /// Shared state, e.g. for inspecting the store after shutdown.
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C, then flushes the store.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            schema = self.state.config.policy.mode(),
            "MUNREG API server listening on {}", addr
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = self.state.store.flush().await {
            warn!(error = %e, "Failed to flush store on shutdown");
        }
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Address the server binds for this configuration.
pub fn bind_addr(config: &ApiConfig) -> std::io::Result<SocketAddr> {
    format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid bind address {}:{}", config.host, config.port),
            )
        })
}

/// Opens the configured store and serves on `config.host:config.port`.
pub async fn start_server(config: ApiConfig) -> std::io::Result<()> {
    let addr = bind_addr(&config)?;
    let server = ApiServer::open(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    server.run(addr).await
}
