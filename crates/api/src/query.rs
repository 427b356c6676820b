//! Query parameter types for the catalog handlers.

use isoshelf_core::error::CoreError;
use isoshelf_core::SearchFilter;
use serde::Deserialize;

/// Bytes per megabyte in size query parameters.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Query parameters for `GET /isos/search` (`?name=&min_size=&max_size=&volume_label=`).
///
/// Sizes are megabytes and may be fractional.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub volume_label: Option<String>,
}

impl SearchParams {
    pub fn into_filter(self) -> Result<SearchFilter, CoreError> {
        Ok(SearchFilter {
            name_contains: self.name,
            min_size_bytes: self.min_size.map(|mb| mb_to_bytes("min_size", mb)).transpose()?,
            max_size_bytes: self.max_size.map(|mb| mb_to_bytes("max_size", mb)).transpose()?,
            label_contains: self.volume_label,
        })
    }
}

/// Convert a megabyte bound to whole bytes, rounding to the nearest byte.
pub fn mb_to_bytes(param: &str, mb: f64) -> Result<u64, CoreError> {
    if !mb.is_finite() || mb < 0.0 {
        return Err(CoreError::Validation(format!(
            "{param} must be a non-negative number of megabytes"
        )));
    }
    // Saturates at u64::MAX for absurdly large bounds.
    Ok((mb * BYTES_PER_MB).round() as u64)
}
