//! File access for the catalog.
//!
//! Two operations per candidate: a metadata query and a single bounded
//! read of the Primary Volume Descriptor sector. The file handle lives
//! only inside [`read_descriptor_region`] and is dropped on every return
//! path, so scanning a large directory never accumulates open files.
//! Nothing here retries; a failed read is reported once and the caller
//! moves on.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::pvd::{PVD_OFFSET, SECTOR_SIZE};
use crate::types::Timestamp;

/// Filesystem-level failures, kept apart from decode failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    #[error("file not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("I/O error: {0}")]
    OtherIo(String),
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::OtherIo(err.to_string()),
        }
    }
}

/// Attributes reported by the host for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub size_bytes: u64,
    /// `None` where the platform or filesystem does not record birth time.
    pub created_at: Option<Timestamp>,
    pub modified_at: Option<Timestamp>,
}

/// Query size and timestamps for `path` (symlinks followed).
pub fn read_attributes(path: &Path) -> Result<FileAttributes, ReaderError> {
    let metadata = std::fs::metadata(path)?;

    Ok(FileAttributes {
        size_bytes: metadata.len(),
        created_at: metadata.created().ok().map(Timestamp::from),
        modified_at: metadata.modified().ok().map(Timestamp::from),
    })
}

/// Read the descriptor sector of the image at `path`.
///
/// Returns up to [`SECTOR_SIZE`] bytes starting at [`PVD_OFFSET`]. A file
/// that ends early yields a short (possibly empty) buffer, which the
/// decoder reports as truncated.
pub fn read_descriptor_region(path: &Path) -> Result<Vec<u8>, ReaderError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(PVD_OFFSET))?;

    let mut sector = Vec::with_capacity(SECTOR_SIZE);
    file.take(SECTOR_SIZE as u64).read_to_end(&mut sector)?;

    Ok(sector)
}
