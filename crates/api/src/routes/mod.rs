pub mod health;
pub mod isos;

use axum::Router;

use crate::state::AppState;

/// Build the catalog route tree.
///
/// Route hierarchy:
///
/// ```text
/// /isos                   list, search, get by id, rescan
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/isos", isos::router())
}
