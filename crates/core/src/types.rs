/// Catalog record identifiers: 1-based, dense within one snapshot.
pub type RecordId = u64;

/// Host filesystem timestamps are normalised to UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Volume descriptor dates keep the GMT offset recorded in the image.
pub type IsoTimestamp = chrono::DateTime<chrono::FixedOffset>;
