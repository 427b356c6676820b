//! ISO9660 Primary Volume Descriptor decoding (ECMA-119 8.4).
//!
//! Pure functions over byte slices. The caller owns all file access; see
//! [`crate::reader`] for the code that fetches the descriptor sector.

use std::ops::Range;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::types::IsoTimestamp;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Logical sector size used by every ISO9660 image.
pub const SECTOR_SIZE: usize = 2048;

/// Sector holding the Primary Volume Descriptor (after the 16-sector system area).
pub const PVD_SECTOR: usize = 16;

/// Byte offset of the Primary Volume Descriptor from the start of the image.
pub const PVD_OFFSET: u64 = (PVD_SECTOR * SECTOR_SIZE) as u64;

/// Bytes of image prefix [`decode`] needs to see the whole descriptor.
pub const MIN_IMAGE_PREFIX: usize = (PVD_SECTOR + 1) * SECTOR_SIZE;

const TYPE_PRIMARY: u8 = 1;
const STANDARD_IDENTIFIER: &[u8] = b"CD001";
const DESCRIPTOR_VERSION: u8 = 1;

const SYSTEM_ID: Range<usize> = 8..40;
const VOLUME_ID: Range<usize> = 40..72;
const VOLUME_SPACE_SIZE: usize = 80;
const LOGICAL_BLOCK_SIZE: usize = 128;
const VOLUME_SET_ID: Range<usize> = 190..318;
const PUBLISHER_ID: Range<usize> = 318..446;
const PREPARER_ID: Range<usize> = 446..574;
const APPLICATION_ID: Range<usize> = 574..702;
const CREATION_DATE: usize = 813;
const MODIFICATION_DATE: usize = 830;
const EXPIRATION_DATE: usize = 847;
const EFFECTIVE_DATE: usize = 864;

/// 16 ASCII digits plus one signed GMT offset byte.
pub const DATE_LEN: usize = 17;

/// GMT offset range, in 15-minute intervals.
const GMT_OFFSET_RANGE: std::ops::RangeInclusive<i8> = -48..=52;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Format of a decoded volume. Only ISO9660 is read today; UDF, Joliet and
/// Rock Ridge would be added as further variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSystemKind {
    #[serde(rename = "ISO9660")]
    Iso9660,
}

impl FileSystemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iso9660 => "ISO9660",
        }
    }
}

impl std::fmt::Display for FileSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character encoding detected across the identifier fields.
///
/// The standard only allows a subset of ASCII, but mastering tools in the
/// wild write UTF-8 or single-byte code pages. Anything that is not valid
/// UTF-8 is read as Latin-1 so decoding itself can never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierEncoding {
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl IdentifierEncoding {
    fn detect(fields: &[&[u8]]) -> Self {
        if fields.iter().all(|f| f.is_ascii()) {
            Self::Ascii
        } else if fields.iter().all(|f| std::str::from_utf8(f).is_ok()) {
            Self::Utf8
        } else {
            Self::Latin1
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii | Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        }
    }
}

/// Fields recovered from a Primary Volume Descriptor.
///
/// String identifiers never carry trailing padding. Dates are `None` when
/// the image marks them as "not specified".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    pub volume_label: String,
    pub file_system_kind: FileSystemKind,
    pub identifier_encoding: IdentifierEncoding,
    pub system_id: String,
    pub volume_set_id: String,
    pub publisher_id: String,
    pub preparer_id: String,
    pub application_id: String,
    /// Volume size in logical blocks.
    pub volume_space_blocks: u32,
    pub logical_block_size: u16,
    pub creation_time: Option<IsoTimestamp>,
    pub modification_time: Option<IsoTimestamp>,
    pub expiration_time: Option<IsoTimestamp>,
    pub effective_time: Option<IsoTimestamp>,
}

/// Why a byte buffer did not yield a [`VolumeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("not an ISO9660 image: no primary volume descriptor at sector 16")]
    NotIso9660,

    #[error("image truncated: got {len} bytes, need {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("malformed {field} field: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

pub type DecodeOutcome = Result<VolumeDescriptor, DecodeError>;

fn malformed(field: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedField {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode the Primary Volume Descriptor from the leading bytes of an image.
///
/// Needs at least [`MIN_IMAGE_PREFIX`] bytes; anything shorter is
/// [`DecodeError::Truncated`].
pub fn decode(image: &[u8]) -> DecodeOutcome {
    if image.len() < MIN_IMAGE_PREFIX {
        return Err(DecodeError::Truncated {
            len: image.len(),
            needed: MIN_IMAGE_PREFIX,
        });
    }
    let start = PVD_SECTOR * SECTOR_SIZE;
    decode_sector(&image[start..start + SECTOR_SIZE])
}

/// Decode a single descriptor sector (the bytes at [`PVD_OFFSET`]).
pub fn decode_sector(sector: &[u8]) -> DecodeOutcome {
    if sector.len() < SECTOR_SIZE {
        return Err(DecodeError::Truncated {
            len: sector.len(),
            needed: SECTOR_SIZE,
        });
    }

    if sector[0] != TYPE_PRIMARY
        || &sector[1..6] != STANDARD_IDENTIFIER
        || sector[6] != DESCRIPTOR_VERSION
    {
        return Err(DecodeError::NotIso9660);
    }

    let volume_id = trim_identifier(&sector[VOLUME_ID]);
    let system_id = trim_identifier(&sector[SYSTEM_ID]);
    let volume_set_id = trim_identifier(&sector[VOLUME_SET_ID]);
    let publisher_id = trim_identifier(&sector[PUBLISHER_ID]);
    let preparer_id = trim_identifier(&sector[PREPARER_ID]);
    let application_id = trim_identifier(&sector[APPLICATION_ID]);

    let encoding = IdentifierEncoding::detect(&[
        volume_id,
        system_id,
        volume_set_id,
        publisher_id,
        preparer_id,
        application_id,
    ]);

    Ok(VolumeDescriptor {
        volume_label: encoding.decode(volume_id),
        file_system_kind: FileSystemKind::Iso9660,
        identifier_encoding: encoding,
        system_id: encoding.decode(system_id),
        volume_set_id: encoding.decode(volume_set_id),
        publisher_id: encoding.decode(publisher_id),
        preparer_id: encoding.decode(preparer_id),
        application_id: encoding.decode(application_id),
        volume_space_blocks: both_endian_u32(sector, VOLUME_SPACE_SIZE, "volume_space_size")?,
        logical_block_size: both_endian_u16(sector, LOGICAL_BLOCK_SIZE, "logical_block_size")?,
        creation_time: decode_datetime("creation_date", &date_field(sector, CREATION_DATE))?,
        modification_time: decode_datetime(
            "modification_date",
            &date_field(sector, MODIFICATION_DATE),
        )?,
        expiration_time: decode_datetime("expiration_date", &date_field(sector, EXPIRATION_DATE))?,
        effective_time: decode_datetime("effective_date", &date_field(sector, EFFECTIVE_DATE))?,
    })
}

/// Strip the trailing space (and stray NUL) padding of a fixed-width field.
pub fn trim_identifier(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |last| last + 1);
    &bytes[..end]
}

fn date_field(sector: &[u8], offset: usize) -> [u8; DATE_LEN] {
    let mut raw = [0u8; DATE_LEN];
    raw.copy_from_slice(&sector[offset..offset + DATE_LEN]);
    raw
}

/// Decode a 17-byte volume descriptor date.
///
/// Layout: `YYYYMMDDHHMMSScc` in ASCII digits followed by a signed GMT
/// offset in 15-minute steps. A field of all `'0'` digits (or all NUL /
/// all spaces, as some mastering tools write) means "not specified".
pub fn decode_datetime(
    field: &'static str,
    raw: &[u8; DATE_LEN],
) -> Result<Option<IsoTimestamp>, DecodeError> {
    let digits = &raw[..16];

    if digits.iter().all(|&b| matches!(b, b'0' | b' ' | 0)) {
        return Ok(None);
    }

    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed(
            field,
            format!("expected 16 digits, got {:?}", String::from_utf8_lossy(digits)),
        ));
    }

    let number = |range: Range<usize>| {
        digits[range]
            .iter()
            .fold(0u32, |acc, &d| acc * 10 + u32::from(d - b'0'))
    };

    let gmt_offset = raw[16] as i8;
    if !GMT_OFFSET_RANGE.contains(&gmt_offset) {
        return Err(malformed(
            field,
            format!("GMT offset {gmt_offset} outside -48..=52"),
        ));
    }
    let zone = FixedOffset::east_opt(i32::from(gmt_offset) * 15 * 60)
        .ok_or_else(|| malformed(field, format!("invalid GMT offset {gmt_offset}")))?;

    let invalid = || {
        malformed(
            field,
            format!("invalid date {}", String::from_utf8_lossy(digits)),
        )
    };

    // Four decimal digits always fit in an i32.
    let year = number(0..4) as i32;
    let local = NaiveDate::from_ymd_opt(year, number(4..6), number(6..8))
        .and_then(|date| {
            date.and_hms_nano_opt(
                number(8..10),
                number(10..12),
                number(12..14),
                number(14..16) * 10_000_000,
            )
        })
        .ok_or_else(invalid)?;

    zone.from_local_datetime(&local)
        .single()
        .map(Some)
        .ok_or_else(invalid)
}

fn both_endian_u32(sector: &[u8], offset: usize, field: &'static str) -> Result<u32, DecodeError> {
    let mut le = [0u8; 4];
    let mut be = [0u8; 4];
    le.copy_from_slice(&sector[offset..offset + 4]);
    be.copy_from_slice(&sector[offset + 4..offset + 8]);
    let (le, be) = (u32::from_le_bytes(le), u32::from_be_bytes(be));
    if le != be {
        return Err(malformed(
            field,
            format!("both-endian halves disagree ({le} vs {be})"),
        ));
    }
    Ok(le)
}

fn both_endian_u16(sector: &[u8], offset: usize, field: &'static str) -> Result<u16, DecodeError> {
    let le = u16::from_le_bytes([sector[offset], sector[offset + 1]]);
    let be = u16::from_be_bytes([sector[offset + 2], sector[offset + 3]]);
    if le != be {
        return Err(malformed(
            field,
            format!("both-endian halves disagree ({le} vs {be})"),
        ));
    }
    Ok(le)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
