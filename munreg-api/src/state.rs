//! App state: store handle and config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use munreg_core::constants::{DEFAULT_HOST, DEFAULT_PORT};
use munreg_core::traits::RegistrationStore;
use munreg_core::validation::ValidationPolicy;
use munreg_storage::MemoryStore;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Creation and update schema
    pub policy: ValidationPolicy,
    /// Snapshot file; in-memory only when unset
    pub data_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            policy: ValidationPolicy::default(),
            data_file: None,
        }
    }
}

impl ApiConfig {
    /// Reads `.env` and the process environment. Unparseable values fall back
    /// to the defaults with a warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let policy = match std::env::var("MUNREG_SCHEMA") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to lenient schema");
                ValidationPolicy::lenient()
            }),
            Err(_) => ValidationPolicy::default(),
        };
        let policy = match std::env::var("DEFAULT_SCHOOL") {
            Ok(school) => policy.with_default_school(school),
            Err(_) => policy,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.into()),
            port,
            policy,
            data_file: std::env::var("DATA_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Shared handler state.
pub struct AppState {
    /// Active configuration
    pub config: ApiConfig,
    /// Registration store
    pub store: Arc<dyn RegistrationStore>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// State over an existing store.
    pub fn with_store(config: ApiConfig, store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            config,
            store,
            started_at: Instant::now(),
        }
    }
}
