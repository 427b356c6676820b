//! Search predicates over a catalog snapshot.
//!
//! Predicates combine with AND. Results keep the input order, which for a
//! snapshot is ascending `id`. Nothing here fails: a miss is an empty
//! result or `None`.

use serde::{Deserialize, Serialize};

use crate::catalog::ImageRecord;
use crate::types::RecordId;

/// A conjunction of optional predicates. The default filter matches
/// every record.
///
/// Empty substrings are treated the same as an absent predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring of `file_name`.
    pub name_contains: Option<String>,
    /// Inclusive lower bound on `size_bytes`.
    pub min_size_bytes: Option<u64>,
    /// Inclusive upper bound on `size_bytes`.
    pub max_size_bytes: Option<u64>,
    /// Case-insensitive substring of the volume label. Records without a
    /// descriptor never match.
    pub label_contains: Option<String>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        non_empty(&self.name_contains).is_none()
            && self.min_size_bytes.is_none()
            && self.max_size_bytes.is_none()
            && non_empty(&self.label_contains).is_none()
    }

    pub fn matches(&self, record: &ImageRecord) -> bool {
        if let Some(needle) = non_empty(&self.name_contains) {
            if !contains_ignore_case(&record.file_name, needle) {
                return false;
            }
        }

        if self.min_size_bytes.is_some_and(|min| record.size_bytes < min) {
            return false;
        }

        if self.max_size_bytes.is_some_and(|max| record.size_bytes > max) {
            return false;
        }

        if let Some(needle) = non_empty(&self.label_contains) {
            match record.volume_label() {
                Some(label) if contains_ignore_case(label, needle) => {}
                _ => return false,
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records matching `filter`, in input order.
pub fn find<'a>(records: &'a [ImageRecord], filter: &SearchFilter) -> Vec<&'a ImageRecord> {
    if filter.is_empty() {
        return records.iter().collect();
    }
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// Look up a record by id.
///
/// O(1) on a catalog snapshot, where record `n` sits at index `n - 1`.
/// Input that is not densely numbered falls back to an O(n) scan.
pub fn get(records: &[ImageRecord], id: RecordId) -> Option<&ImageRecord> {
    let index = usize::try_from(id).ok()?.checked_sub(1)?;

    match records.get(index) {
        Some(record) if record.id == id => Some(record),
        _ => records.iter().find(|r| r.id == id),
    }
}
