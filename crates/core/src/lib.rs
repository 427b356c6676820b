//! Disk-image catalog core.
//!
//! Reads the ISO9660 Primary Volume Descriptor of every image in a
//! directory, keeps the results as an immutable in-memory snapshot, and
//! answers structured queries over it. No HTTP and no environment
//! variables live here; the API crate adapts this to the wire.

pub mod catalog;
pub mod error;
pub mod pvd;
pub mod query;
pub mod reader;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, CatalogConfig, ImageRecord, RefreshPolicy, Snapshot};
pub use error::CoreError;
pub use pvd::{DecodeError, DecodeOutcome, VolumeDescriptor};
pub use query::SearchFilter;
pub use reader::ReaderError;
