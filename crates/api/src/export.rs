//! One-shot catalog export to a JSON file.
//!
//! Writes `{"items": [...]}` using the same record shape as `GET /isos`,
//! for consumers that read a static file instead of calling the API.

use std::path::Path;

use isoshelf_core::catalog;
use isoshelf_core::error::CoreError;
use serde::Serialize;

use crate::response::IsoFileResponse;

/// File name used when no explicit output path is configured.
pub const DEFAULT_EXPORT_FILE: &str = "data.json";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level export document.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub items: Vec<IsoFileResponse>,
}

/// Scan `iso_dir` once and build the export document.
pub fn build_export(iso_dir: &Path) -> Result<ExportDocument, CoreError> {
    let records = catalog::scan(iso_dir)?;
    Ok(ExportDocument {
        items: records.iter().map(IsoFileResponse::from).collect(),
    })
}

/// Scan `iso_dir` and write the document to `output`. Returns the item count.
pub fn write_export(iso_dir: &Path, output: &Path) -> Result<usize, ExportError> {
    let document = build_export(iso_dir)?;
    let bytes = serde_json::to_vec_pretty(&document)?;

    std::fs::write(output, bytes).map_err(|source| ExportError::Write {
        path: output.display().to_string(),
        source,
    })?;

    tracing::info!(
        items = document.items.len(),
        output = %output.display(),
        "Catalog exported"
    );
    Ok(document.items.len())
}
