//! Synthetic image and record builders shared by the unit tests.
//!
//! Offsets are written out literally so the decoder's own layout table
//! is checked against an independent copy.

use std::path::{Path, PathBuf};

use crate::catalog::ImageRecord;
use crate::pvd::{FileSystemKind, IdentifierEncoding, VolumeDescriptor};
use crate::types::RecordId;

pub const SECTOR: usize = 2048;
pub const PVD_START: usize = 16 * SECTOR;

/// Builds a single Primary Volume Descriptor sector.
pub struct PvdBuilder {
    sector: Vec<u8>,
}

impl PvdBuilder {
    /// A valid, otherwise blank descriptor: space-padded identifiers and
    /// every date field set to the "not specified" digits.
    pub fn new() -> Self {
        let mut sector = vec![0u8; SECTOR];
        sector[0] = 1;
        sector[1..6].copy_from_slice(b"CD001");
        sector[6] = 1;
        sector[8..72].fill(b' ');
        sector[190..813].fill(b' ');
        for start in [813, 830, 847, 864] {
            sector[start..start + 16].fill(b'0');
            sector[start + 16] = 0;
        }
        let mut builder = Self { sector };
        builder.both_endian_u16(128, 2048);
        builder
    }

    pub fn volume_label(self, value: &str) -> Self {
        self.text(40, 32, value.as_bytes())
    }

    pub fn system_id(self, value: &str) -> Self {
        self.text(8, 32, value.as_bytes())
    }

    pub fn volume_set_id(self, value: &str) -> Self {
        self.text(190, 128, value.as_bytes())
    }

    pub fn publisher_id(self, value: &str) -> Self {
        self.text(318, 128, value.as_bytes())
    }

    pub fn preparer_id(self, value: &str) -> Self {
        self.text(446, 128, value.as_bytes())
    }

    pub fn application_id(self, value: &str) -> Self {
        self.text(574, 128, value.as_bytes())
    }

    /// Write a raw identifier (for encodings other than ASCII).
    pub fn raw_volume_label(self, value: &[u8]) -> Self {
        self.text(40, 32, value)
    }

    pub fn creation_date(self, digits: &str, gmt_offset: i8) -> Self {
        self.date(813, digits, gmt_offset)
    }

    pub fn modification_date(self, digits: &str, gmt_offset: i8) -> Self {
        self.date(830, digits, gmt_offset)
    }

    pub fn volume_space_blocks(mut self, blocks: u32) -> Self {
        self.sector[80..84].copy_from_slice(&blocks.to_le_bytes());
        self.sector[84..88].copy_from_slice(&blocks.to_be_bytes());
        self
    }

    /// Overwrite arbitrary bytes, for corrupting specific fields.
    pub fn raw(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.sector[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn sector(self) -> Vec<u8> {
        self.sector
    }

    /// Sixteen zeroed system-area sectors followed by the descriptor.
    pub fn image(self) -> Vec<u8> {
        let mut image = vec![0u8; PVD_START];
        image.extend_from_slice(&self.sector);
        image
    }

    pub fn write_image(self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.image()).unwrap();
        path
    }

    fn text(mut self, offset: usize, width: usize, value: &[u8]) -> Self {
        let field = &mut self.sector[offset..offset + width];
        field.fill(b' ');
        field[..value.len()].copy_from_slice(value);
        self
    }

    fn date(mut self, offset: usize, digits: &str, gmt_offset: i8) -> Self {
        assert_eq!(digits.len(), 16, "date digits must be 16 characters");
        self.sector[offset..offset + 16].copy_from_slice(digits.as_bytes());
        self.sector[offset + 16] = gmt_offset as u8;
        self
    }

    fn both_endian_u16(&mut self, offset: usize, value: u16) {
        self.sector[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self.sector[offset + 2..offset + 4].copy_from_slice(&value.to_be_bytes());
    }
}

/// A catalog record with no filesystem behind it, for query tests.
pub fn record(id: RecordId, file_name: &str, size_bytes: u64, label: Option<&str>) -> ImageRecord {
    ImageRecord {
        id,
        file_name: file_name.to_string(),
        file_path: PathBuf::from("/isofiles").join(file_name),
        size_bytes,
        created_at: None,
        modified_at: None,
        descriptor: label.map(descriptor),
        descriptor_error: match label {
            Some(_) => None,
            None => Some(crate::catalog::DescriptorError::NotIso9660),
        },
        attributes_error: None,
    }
}

fn descriptor(label: &str) -> VolumeDescriptor {
    VolumeDescriptor {
        volume_label: label.to_string(),
        file_system_kind: FileSystemKind::Iso9660,
        identifier_encoding: IdentifierEncoding::Ascii,
        system_id: String::new(),
        volume_set_id: String::new(),
        publisher_id: String::new(),
        preparer_id: String::new(),
        application_id: String::new(),
        volume_space_blocks: 0,
        logical_block_size: 2048,
        creation_time: None,
        modification_time: None,
        expiration_time: None,
        effective_time: None,
    }
}
