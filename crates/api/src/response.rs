//! Wire shapes for catalog responses.
//!
//! Catalog endpoints return bare JSON (a list or a single object), not a
//! `{ "data": ... }` envelope. Derived size forms live here; the core only
//! carries raw byte counts.

use isoshelf_core::types::{IsoTimestamp, RecordId, Timestamp};
use isoshelf_core::ImageRecord;
use serde::Serialize;

use crate::query::BYTES_PER_MB;

/// One catalogued image as served over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct IsoFileResponse {
    pub id: RecordId,
    pub name: String,
    /// Size in binary megabytes, rounded to two decimals.
    pub size_mb: f64,
    pub size_bytes: u64,
    /// Size in decimal units, e.g. `"1.2 GB"`.
    pub size_human: String,
    pub created_date: Option<Timestamp>,
    pub modified_date: Option<Timestamp>,
    pub path: String,
    pub volume_label: Option<String>,
    pub file_system: Option<&'static str>,
    pub is_valid_iso: bool,
    pub iso_creation_date: Option<IsoTimestamp>,
    pub iso_modification_date: Option<IsoTimestamp>,
    pub iso_application_id: Option<String>,
    pub iso_publisher_id: Option<String>,
    pub iso_preparer_id: Option<String>,
    pub iso_identifier_encoding: Option<&'static str>,
    /// Why the descriptor or the file attributes could not be read.
    pub error: Option<String>,
}

impl From<&ImageRecord> for IsoFileResponse {
    fn from(record: &ImageRecord) -> Self {
        let descriptor = record.descriptor.as_ref();
        let error = record
            .descriptor_error
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| record.attributes_error.clone());

        Self {
            id: record.id,
            name: record.file_name.clone(),
            size_mb: size_mb(record.size_bytes),
            size_bytes: record.size_bytes,
            size_human: format_size_human(record.size_bytes),
            created_date: record.created_at,
            modified_date: record.modified_at,
            path: record.file_path.display().to_string(),
            volume_label: descriptor.map(|d| d.volume_label.clone()),
            file_system: descriptor.map(|d| d.file_system_kind.as_str()),
            is_valid_iso: record.is_valid_iso(),
            iso_creation_date: descriptor.and_then(|d| d.creation_time),
            iso_modification_date: descriptor.and_then(|d| d.modification_time),
            iso_application_id: descriptor.map(|d| d.application_id.clone()),
            iso_publisher_id: descriptor.map(|d| d.publisher_id.clone()),
            iso_preparer_id: descriptor.map(|d| d.preparer_id.clone()),
            iso_identifier_encoding: descriptor.map(|d| d.identifier_encoding.as_str()),
            error,
        }
    }
}

/// Result of `POST /isos/rescan`.
#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub records: usize,
    pub scanned_at: Option<Timestamp>,
}

pub fn size_mb(size_bytes: u64) -> f64 {
    (size_bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Format a byte count with decimal (power-of-1000) units and one decimal place.
pub fn format_size_human(size_bytes: u64) -> String {
    const UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    match size_bytes {
        1 => return "1 Byte".to_string(),
        n if n < 1000 => return format!("{n} Bytes"),
        _ => {}
    }

    let bytes = size_bytes as f64;
    let mut unit_size = 1000.0_f64;
    for unit in UNITS {
        if bytes < unit_size * 1000.0 {
            return format!("{:.1} {unit}", bytes / unit_size);
        }
        unit_size *= 1000.0;
    }
    format!("{:.1} YB", bytes / (unit_size / 1000.0))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use isoshelf_core::catalog::DescriptorError;

    use super::*;

    fn invalid_record() -> ImageRecord {
        ImageRecord {
            id: 7,
            file_name: "broken.iso".into(),
            file_path: PathBuf::from("/isofiles/broken.iso"),
            size_bytes: 3 * 1024 * 1024,
            created_at: None,
            modified_at: None,
            descriptor: None,
            descriptor_error: Some(DescriptorError::NotIso9660),
            attributes_error: None,
        }
    }

    // -- sizes ---------------------------------------------------------------

    #[test]
    fn human_sizes_use_decimal_units() {
        assert_eq!(format_size_human(0), "0 Bytes");
        assert_eq!(format_size_human(1), "1 Byte");
        assert_eq!(format_size_human(999), "999 Bytes");
        assert_eq!(format_size_human(1000), "1.0 kB");
        assert_eq!(format_size_human(1_234_567), "1.2 MB");
        assert_eq!(format_size_human(4_700_000_000), "4.7 GB");
        assert_eq!(format_size_human(2_000_000_000_000), "2.0 TB");
    }

    #[test]
    fn size_mb_rounds_to_two_decimals() {
        assert_eq!(size_mb(1_048_576), 1.0);
        assert_eq!(size_mb(1_572_864), 1.5);
        assert_eq!(size_mb(1_000_000), 0.95);
        assert_eq!(size_mb(0), 0.0);
    }

    // -- records -------------------------------------------------------------

    #[test]
    fn invalid_record_has_null_iso_fields_and_error() {
        let response = IsoFileResponse::from(&invalid_record());

        assert_eq!(response.id, 7);
        assert_eq!(response.size_mb, 3.0);
        assert!(!response.is_valid_iso);
        assert!(response.volume_label.is_none());
        assert!(response.file_system.is_none());
        assert!(response.iso_identifier_encoding.is_none());
        assert_eq!(response.error.as_deref(), Some("not an ISO9660 image"));
        assert_eq!(response.path, "/isofiles/broken.iso");
    }

    #[test]
    fn attribute_error_surfaces_when_descriptor_error_absent() {
        let mut record = invalid_record();
        record.descriptor_error = None;
        record.attributes_error = Some("permission denied".into());

        let response = IsoFileResponse::from(&record);

        assert_eq!(response.error.as_deref(), Some("permission denied"));
    }

    #[test]
    fn serialized_shape_keeps_null_fields() {
        let json = serde_json::to_value(IsoFileResponse::from(&invalid_record())).unwrap();

        assert!(json["volume_label"].is_null());
        assert!(json["iso_creation_date"].is_null());
        assert_eq!(json["is_valid_iso"], false);
        assert_eq!(json["size_human"], "3.1 MB");
    }
}
