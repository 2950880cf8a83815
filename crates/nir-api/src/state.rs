//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The ward service sits behind a `parking_lot::Mutex`. Each request runs
//! one load/apply/commit cycle under the lock on the blocking thread pool,
//! since the cycle does file I/O, and never holds the lock across an
//! `.await`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use nir_ledger::DEFAULT_AUDIT_CAPACITY;
use nir_store::{Repository, ServiceError, WardService};

use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;

/// Server configuration, read from the environment by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// JSON document directory; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub audit_capacity: usize,
    /// Fixed delay added to every request.
    pub simulated_latency: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: None,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            simulated_latency: Duration::ZERO,
        }
    }
}

impl AppConfig {
    /// `PORT`, `NIR_DATA_DIR`, `NIR_AUDIT_CAPACITY`, `NIR_SIMULATED_LATENCY_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Unparseable values fall back to the
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            data_dir: lookup("NIR_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            audit_capacity: parsed(&lookup, "NIR_AUDIT_CAPACITY")
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.audit_capacity),
            simulated_latency: parsed(&lookup, "NIR_SIMULATED_LATENCY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.simulated_latency),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<Mutex<WardService>>,
    pub config: AppConfig,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// In-memory board with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Open the repository the configuration points at.
    pub fn with_config(config: AppConfig) -> Self {
        let repo = match &config.data_dir {
            Some(dir) => Repository::open_dir(dir),
            None => Repository::in_memory(),
        }
        .with_audit_capacity(config.audit_capacity);
        Self::with_service(WardService::new(repo), config)
    }

    pub fn with_service(service: WardService, config: AppConfig) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            config,
            metrics: ApiMetrics::new(),
        }
    }

    /// Run one service call under the lock on a blocking worker thread.
    pub async fn run<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&WardService) -> Result<R, ServiceError> + Send + 'static,
        R: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || {
            let service = service.lock();
            f(&service)
        })
        .await
        .map_err(|e| AppError::Internal(format!("service task failed: {e}")))?
        .map_err(AppError::from)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
