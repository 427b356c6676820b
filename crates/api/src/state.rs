use std::sync::Arc;

use isoshelf_core::Catalog;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The image catalog; owns the current snapshot and rescans.
    pub catalog: Arc<Catalog>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let catalog = Catalog::new(config.catalog_config());
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}
