//! Route definitions for the image catalog.
//!
//! Mounted at `/isos`.
//!
//! ```text
//! GET    /            list_isos
//! GET    /search      search_isos
//! GET    /search/     search_isos
//! POST   /rescan      rescan
//! GET    /{id}        get_iso
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::isos;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(isos::list_isos))
        .route("/search", get(isos::search_isos))
        .route("/search/", get(isos::search_isos))
        .route("/rescan", post(isos::rescan))
        .route("/{id}", get(isos::get_iso))
}
