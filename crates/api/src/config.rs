use std::path::PathBuf;
use std::time::Duration;

use isoshelf_core::catalog::DEFAULT_SCAN_WORKERS;
use isoshelf_core::{CatalogConfig, RefreshPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding the images to catalog (default: `/isofiles`).
    pub iso_dir: PathBuf,
    /// Files inspected concurrently per scan (default: `4`).
    pub scan_workers: usize,
    /// Background rescan period in seconds. `0` rescans on every request.
    pub refresh_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `8000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `ISO_DIR`               | `/isofiles`             |
    /// | `SCAN_WORKERS`          | `4`                     |
    /// | `REFRESH_INTERVAL_SECS` | `0`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let iso_dir = std::env::var("ISO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/isofiles"));

        let scan_workers: usize = std::env::var("SCAN_WORKERS")
            .ok()
            .map(|v| v.parse().expect("SCAN_WORKERS must be a valid usize"))
            .unwrap_or(DEFAULT_SCAN_WORKERS);

        let refresh_interval_secs: u64 = std::env::var("REFRESH_INTERVAL_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("REFRESH_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            iso_dir,
            scan_workers,
            refresh_interval_secs,
        }
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        match self.refresh_interval_secs {
            0 => RefreshPolicy::OnDemand,
            secs => RefreshPolicy::Interval(Duration::from_secs(secs)),
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new(self.iso_dir.clone())
            .with_workers(self.scan_workers)
            .with_refresh(self.refresh_policy())
    }
}
