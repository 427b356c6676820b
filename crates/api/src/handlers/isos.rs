//! Handlers for the image catalog.
//!
//! Read endpoints go through [`Catalog::fresh_snapshot`], so under the
//! default on-demand policy every request sees the directory as it is now.
//!
//! [`Catalog::fresh_snapshot`]: isoshelf_core::Catalog::fresh_snapshot

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use isoshelf_core::error::CoreError;
use isoshelf_core::types::RecordId;

use crate::error::{AppError, AppResult};
use crate::query::SearchParams;
use crate::response::{IsoFileResponse, RescanResponse};
use crate::state::AppState;

/// GET /isos
///
/// Every catalogued image, in id order.
pub async fn list_isos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.catalog.fresh_snapshot().await?;

    let items: Vec<IsoFileResponse> = snapshot.records.iter().map(IsoFileResponse::from).collect();
    Ok(Json(items))
}

/// GET /isos/search
///
/// Filter by name substring, size range in megabytes, and volume label
/// substring. Omitted parameters do not constrain the result.
pub async fn search_isos(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let filter = params.into_filter()?;
    let snapshot = state.catalog.fresh_snapshot().await?;

    let items: Vec<IsoFileResponse> = snapshot
        .find(&filter)
        .into_iter()
        .map(IsoFileResponse::from)
        .collect();

    tracing::debug!(
        filter = ?filter,
        matched = items.len(),
        total = snapshot.len(),
        "Catalog search"
    );

    Ok(Json(items))
}

/// GET /isos/{id}
///
/// Any integer is accepted; ids outside `1..=N` (including negative ones)
/// are a 404 rather than a parse failure.
pub async fn get_iso(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let snapshot = state.catalog.fresh_snapshot().await?;

    let id = RecordId::try_from(id).unwrap_or(0);
    let record = snapshot.get(id).ok_or(CoreError::NotFound {
        entity: "ISO file",
        id,
    })?;

    Ok(Json(IsoFileResponse::from(record)))
}

/// POST /isos/rescan
///
/// Rescan the directory now, regardless of refresh policy.
pub async fn rescan(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.catalog.refresh().await?;

    tracing::info!(records = snapshot.len(), "Manual rescan complete");

    Ok(Json(RescanResponse {
        records: snapshot.len(),
        scanned_at: snapshot.scanned_at,
    }))
}
