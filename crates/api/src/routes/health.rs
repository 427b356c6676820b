use std::path::PathBuf;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use isoshelf_core::types::Timestamp;
use serde::Serialize;

use crate::state::AppState;

/// Root welcome payload.
#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Directory being catalogued.
    pub iso_dir: PathBuf,
    /// Records in the most recently published snapshot.
    pub records: usize,
    /// When that snapshot was taken; `null` before the first scan.
    pub scanned_at: Option<Timestamp>,
}

/// GET / -- welcome message.
async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the ISO Files API",
    })
}

/// GET /health -- reports the current snapshot without triggering a scan.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.catalog.snapshot().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        iso_dir: snapshot.directory.clone(),
        records: snapshot.len(),
        scanned_at: snapshot.scanned_at,
    })
}

/// Mount the welcome and health routes at the root level.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
