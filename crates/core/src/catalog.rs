//! Directory scanning and the snapshot-and-swap catalog.
//!
//! A scan turns every candidate image in one directory into exactly one
//! [`ImageRecord`], whether or not its descriptor decodes. Results are
//! published as an immutable [`Snapshot`]; a rescan builds a new snapshot
//! and swaps it in, so a reader holding the previous `Arc` keeps seeing a
//! consistent record set until it lets go.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::pvd::{self, DecodeError, VolumeDescriptor};
use crate::query::{self, SearchFilter};
use crate::reader::{self, FileAttributes, ReaderError};
use crate::types::{RecordId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// File extension (case-insensitive) that marks a candidate image.
pub const ISO_EXTENSION: &str = "iso";

/// Default number of files inspected concurrently.
pub const DEFAULT_SCAN_WORKERS: usize = 4;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Why a record has no volume descriptor.
///
/// Merges [`ReaderError`] and [`DecodeError`] so "no such file",
/// "not an ISO image" and "corrupt field" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorError {
    #[error("file not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("I/O error: {reason}")]
    Io { reason: String },

    #[error("not an ISO9660 image")]
    NotIso9660,

    #[error("image truncated before the primary volume descriptor")]
    Truncated,

    #[error("malformed {field} field: {reason}")]
    MalformedField { field: String, reason: String },
}

impl From<ReaderError> for DescriptorError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::NotFound => Self::NotFound,
            ReaderError::PermissionDenied => Self::PermissionDenied,
            ReaderError::OtherIo(reason) => Self::Io { reason },
        }
    }
}

impl From<DecodeError> for DescriptorError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::NotIso9660 => Self::NotIso9660,
            DecodeError::Truncated { .. } => Self::Truncated,
            DecodeError::MalformedField { field, reason } => Self::MalformedField {
                field: field.to_string(),
                reason,
            },
        }
    }
}

/// One catalogued file.
///
/// `descriptor` is `None` exactly when `descriptor_error` is `Some`.
/// Attribute failures zero the size, blank the timestamps and leave a
/// note in `attributes_error`; the record is kept either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: RecordId,
    pub file_name: String,
    /// Full path used to re-read the file.
    pub file_path: PathBuf,
    pub size_bytes: u64,
    pub created_at: Option<Timestamp>,
    pub modified_at: Option<Timestamp>,
    pub descriptor: Option<VolumeDescriptor>,
    pub descriptor_error: Option<DescriptorError>,
    pub attributes_error: Option<String>,
}

impl ImageRecord {
    pub fn is_valid_iso(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn volume_label(&self) -> Option<&str> {
        self.descriptor.as_ref().map(|d| d.volume_label.as_str())
    }
}

/// What one worker learns about one candidate, before ids exist.
#[derive(Debug)]
struct Inspection {
    file_name: String,
    file_path: PathBuf,
    attributes: Result<FileAttributes, ReaderError>,
    descriptor: Result<VolumeDescriptor, DescriptorError>,
}

impl Inspection {
    fn into_record(self, id: RecordId) -> ImageRecord {
        let (attributes, attributes_error) = match self.attributes {
            Ok(attributes) => (attributes, None),
            Err(e) => (FileAttributes::default(), Some(e.to_string())),
        };
        let (descriptor, descriptor_error) = match self.descriptor {
            Ok(descriptor) => (Some(descriptor), None),
            Err(e) => (None, Some(e)),
        };

        ImageRecord {
            id,
            file_name: self.file_name,
            file_path: self.file_path,
            size_bytes: attributes.size_bytes,
            created_at: attributes.created_at,
            modified_at: attributes.modified_at,
            descriptor,
            descriptor_error,
            attributes_error,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

fn has_iso_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ISO_EXTENSION))
}

fn unreadable(directory: &Path, err: &io::Error) -> CoreError {
    CoreError::DirectoryUnreadable {
        path: directory.display().to_string(),
        reason: err.to_string(),
    }
}

/// List candidate images in `directory`, sorted by file name.
///
/// Only regular files (symlinks followed) qualify. A missing directory
/// yields no candidates. Entries that cannot be stat'ed are still
/// candidates so they surface as records with an error.
pub fn candidates(directory: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let directory = match directory.canonicalize() {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(
                directory = %directory.display(),
                "Image directory does not exist, nothing to catalog"
            );
            return Ok(Vec::new());
        }
        Err(e) => return Err(unreadable(directory, &e)),
    };

    let entries = std::fs::read_dir(&directory).map_err(|e| unreadable(&directory, &e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| unreadable(&directory, &e))?.path();
        if !has_iso_extension(&path) {
            continue;
        }
        // Opening a FIFO or device would block the scan.
        if std::fs::metadata(&path).is_ok_and(|m| !m.is_file()) {
            continue;
        }
        paths.push(path);
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn inspect(file_path: PathBuf) -> Inspection {
    let file_name = file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let attributes = reader::read_attributes(&file_path);
    if let Err(e) = &attributes {
        tracing::warn!(path = %file_path.display(), error = %e, "Failed to read file attributes");
    }

    let descriptor = reader::read_descriptor_region(&file_path)
        .map_err(DescriptorError::from)
        .and_then(|sector| pvd::decode_sector(&sector).map_err(DescriptorError::from));

    match &descriptor {
        Ok(d) => tracing::debug!(
            path = %file_path.display(),
            volume_label = %d.volume_label,
            "Decoded primary volume descriptor"
        ),
        Err(e) => tracing::warn!(
            path = %file_path.display(),
            error = %e,
            "No volume descriptor for image"
        ),
    }

    Inspection {
        file_name,
        file_path,
        attributes,
        descriptor,
    }
}

/// Assign dense 1-based ids in the order the inspections arrive.
fn assemble(inspections: Vec<Inspection>) -> Vec<ImageRecord> {
    inspections
        .into_iter()
        .zip(1..)
        .map(|(inspection, id)| inspection.into_record(id))
        .collect()
}

fn log_summary(directory: &Path, records: &[ImageRecord], started: Instant) {
    let valid = records.iter().filter(|r| r.is_valid_iso()).count();
    tracing::info!(
        directory = %directory.display(),
        records = records.len(),
        valid,
        invalid = records.len() - valid,
        duration_ms = started.elapsed().as_millis() as u64,
        "Catalog scan complete"
    );
}

/// Scan `directory` sequentially on the calling thread.
pub fn scan(directory: &Path) -> Result<Vec<ImageRecord>, CoreError> {
    let started = Instant::now();
    let paths = candidates(directory)?;
    let records = assemble(paths.into_iter().map(inspect).collect());
    log_summary(directory, &records, started);
    Ok(records)
}

/// Scan `directory` with up to `workers` files in flight on the blocking
/// pool. Completion order does not matter: `buffered` yields results in
/// candidate order, and ids are assigned only after reassembly.
pub async fn scan_with_workers(
    directory: &Path,
    workers: usize,
) -> Result<Vec<ImageRecord>, CoreError> {
    let started = Instant::now();
    let owned = directory.to_path_buf();
    let paths = tokio::task::spawn_blocking(move || candidates(&owned))
        .await
        .map_err(|e| CoreError::Internal(format!("Candidate listing task failed: {e}")))??;

    let inspections: Vec<Inspection> = stream::iter(paths)
        .map(|path| tokio::task::spawn_blocking(move || inspect(path)))
        .buffered(workers.max(1))
        .map_err(|e| CoreError::Internal(format!("Image inspection task failed: {e}")))
        .try_collect()
        .await?;

    let records = assemble(inspections);
    log_summary(directory, &records, started);
    Ok(records)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable, point-in-time record set.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub directory: PathBuf,
    /// `None` until the first scan has completed.
    pub scanned_at: Option<Timestamp>,
    pub records: Vec<ImageRecord>,
    #[serde(skip)]
    scan_started: Option<Instant>,
}

impl Snapshot {
    /// The placeholder published before any scan has run.
    pub fn empty(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            scanned_at: None,
            records: Vec::new(),
            scan_started: None,
        }
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, filter: &SearchFilter) -> Vec<&ImageRecord> {
        query::find(&self.records, filter)
    }

    /// O(1): snapshot ids are dense and match record positions.
    pub fn get(&self, id: RecordId) -> Option<&ImageRecord> {
        query::get(&self.records, id)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// When the catalog rescans its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Every [`Catalog::fresh_snapshot`] call rescans; results are always current.
    OnDemand,
    /// A background loop rescans on this period; reads use the latest snapshot.
    Interval(Duration),
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub directory: PathBuf,
    /// Concurrent file inspections per scan (at least 1).
    pub workers: usize,
    pub refresh: RefreshPolicy,
}

impl CatalogConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            workers: DEFAULT_SCAN_WORKERS,
            refresh: RefreshPolicy::OnDemand,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Owns the current snapshot of one image directory.
///
/// Designed to be wrapped in `Arc` and shared. Readers get an
/// `Arc<Snapshot>` that never changes underneath them; rescans are
/// serialized and published by swapping the `Arc`.
pub struct Catalog {
    config: CatalogConfig,
    current: RwLock<Arc<Snapshot>>,
    scan_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> Self {
        let empty = Snapshot::empty(config.directory.clone());
        Self {
            config,
            current: RwLock::new(Arc::new(empty)),
            scan_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The most recently published snapshot. No I/O.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rescan the directory and publish the result.
    ///
    /// Callers that queue up behind a scan which started after they
    /// arrived reuse that scan's snapshot instead of reading the disk again.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let requested = Instant::now();
        let _guard = self.scan_lock.lock().await;

        let current = self.snapshot().await;
        if current.scan_started.is_some_and(|started| started >= requested) {
            tracing::debug!("Reusing snapshot from a scan that started after this request");
            return Ok(current);
        }

        let scan_started = Instant::now();
        let records = scan_with_workers(&self.config.directory, self.config.workers).await?;
        let snapshot = Arc::new(Snapshot {
            directory: self.config.directory.clone(),
            scanned_at: Some(chrono::Utc::now()),
            records,
            scan_started: Some(scan_started),
        });

        *self.current.write().await = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    /// A snapshot that honours the refresh policy: a new scan under
    /// [`RefreshPolicy::OnDemand`], the latest published one otherwise
    /// (scanning once if nothing has been published yet).
    pub async fn fresh_snapshot(&self) -> Result<Arc<Snapshot>, CoreError> {
        match self.config.refresh {
            RefreshPolicy::OnDemand => self.refresh().await,
            RefreshPolicy::Interval(_) => {
                let current = self.snapshot().await;
                if current.is_scanned() {
                    Ok(current)
                } else {
                    self.refresh().await
                }
            }
        }
    }
}

/// Rescan `catalog` every `every` until `cancel` fires.
///
/// Intended to be spawned with `tokio::spawn` when the catalog uses
/// [`RefreshPolicy::Interval`]. Scan failures are logged and retried on
/// the next tick.
pub async fn run_refresh_loop(catalog: Arc<Catalog>, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        directory = %catalog.config().directory.display(),
        interval_secs = every.as_secs(),
        "Catalog refresh loop started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Catalog refresh loop stopping");
                break;
            }
            _ = interval.tick() => {
                match catalog.refresh().await {
                    Ok(snapshot) => {
                        tracing::debug!(records = snapshot.len(), "Catalog refreshed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Catalog refresh failed");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
