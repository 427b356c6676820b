use crate::types::RecordId;

/// Errors surfaced to callers of the catalog.
///
/// Single-file failures never show up here; they are recorded on the
/// corresponding [`ImageRecord`](crate::catalog::ImageRecord) instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("Directory unreadable: {path}: {reason}")]
    DirectoryUnreadable { path: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
