//! Fixed-layout ZIP records.
//!
//! Each record is decoded from a buffer already sized to its fixed part;
//! field offsets are relative to the start of the signature.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ZipError;

/// Compression method of one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Stored,
            8 => Self::Deflate,
            other => Self::Unknown(other),
        }
    }
}

pub const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
pub const EOCD_SIZE: usize = 22;

pub const ZIP64_LOCATOR_SIGNATURE: &[u8] = b"PK\x06\x07";
pub const ZIP64_LOCATOR_SIZE: usize = 20;

pub const ZIP64_EOCD_SIGNATURE: &[u8] = b"PK\x06\x06";
pub const ZIP64_EOCD_SIZE: usize = 56;

pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Ensure `data` holds a `record` of at least `size` bytes.
pub fn expect_record(data: &[u8], signature: &[u8], size: usize, record: &str) -> Result<(), ZipError> {
    if data.len() < size || !data.starts_with(signature) {
        return Err(ZipError::invalid(format!("bad {record} record")));
    }
    Ok(())
}

/// Where the central directory lives and how many records it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryLocation {
    pub offset: u64,
    pub size: u64,
    pub entries: u64,
}

/// Classic End of Central Directory record.
///
/// `location` is `None` when any field is saturated, meaning the real values
/// live in the ZIP64 record.
#[derive(Debug)]
pub struct EndOfCentralDirectory {
    pub location: Option<DirectoryLocation>,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub fn decode(data: &[u8]) -> Result<Self, ZipError> {
        expect_record(data, EOCD_SIGNATURE, EOCD_SIZE, "end of central directory")?;

        // Multi-disk archives are not served, so the disk numbers at 4..8
        // are ignored.
        let disk_entries = LittleEndian::read_u16(&data[8..10]);
        let entries = LittleEndian::read_u16(&data[10..12]);
        let size = LittleEndian::read_u32(&data[12..16]);
        let offset = LittleEndian::read_u32(&data[16..20]);

        let saturated = disk_entries == u16::MAX
            || entries == u16::MAX
            || size == u32::MAX
            || offset == u32::MAX;

        Ok(Self {
            location: (!saturated).then_some(DirectoryLocation {
                offset: u64::from(offset),
                size: u64::from(size),
                entries: u64::from(entries),
            }),
            comment_len: LittleEndian::read_u16(&data[20..22]),
        })
    }
}

/// Offset of the ZIP64 End of Central Directory, from its locator.
pub fn decode_zip64_locator(data: &[u8]) -> Result<u64, ZipError> {
    expect_record(data, ZIP64_LOCATOR_SIGNATURE, ZIP64_LOCATOR_SIZE, "ZIP64 locator")?;
    Ok(LittleEndian::read_u64(&data[8..16]))
}

/// Directory location from a ZIP64 End of Central Directory record.
pub fn decode_zip64_eocd(data: &[u8]) -> Result<DirectoryLocation, ZipError> {
    expect_record(data, ZIP64_EOCD_SIGNATURE, ZIP64_EOCD_SIZE, "ZIP64 end of central directory")?;
    Ok(DirectoryLocation {
        entries: LittleEndian::read_u64(&data[32..40]),
        size: LittleEndian::read_u64(&data[40..48]),
        offset: LittleEndian::read_u64(&data[48..56]),
    })
}

/// Metadata for one central directory record
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    /// Name exactly as stored in the archive
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub lfh_offset: u64,
    pub is_directory: bool,
}
