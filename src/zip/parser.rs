//! Low-level ZIP archive parser.
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For reads, resolve each entry's Local File Header to find its data
//!
//! Every structure is bounds-checked against the archive size before it is
//! read, so a truncated or hostile file turns into [`ZipError::InvalidFormat`]
//! rather than a huge allocation.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::ZipError;
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser, generic over the byte source.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor).
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and decode the End of Central Directory record.
    ///
    /// Returns the record and its offset in the file.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ZipError> {
        let eocd_size = EOCD_SIZE as u64;
        if self.size < eocd_size {
            return Err(ZipError::invalid("file too small to be a ZIP archive"));
        }

        // Common case: no archive comment, EOCD is the last 22 bytes.
        let offset = self.size - eocd_size;
        let mut buf = [0u8; EOCD_SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;
        if buf.starts_with(EOCD_SIGNATURE) && buf[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::decode(&buf)?, offset));
        }

        // Otherwise search backwards through the maximum comment window.
        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;
        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EOCD_SIZE).rev() {
            if !buf[i..].starts_with(EOCD_SIGNATURE) {
                continue;
            }
            let eocd = EndOfCentralDirectory::decode(&buf[i..i + EOCD_SIZE])?;
            // The comment must account for exactly the remaining bytes.
            if usize::from(eocd.comment_len) == buf.len() - i - EOCD_SIZE {
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ZipError::invalid("end of central directory not found"))
    }

    /// Locate the central directory through the ZIP64 locator that sits
    /// immediately before the regular EOCD.
    pub async fn read_zip64_location(&self, eocd_offset: u64) -> Result<DirectoryLocation, ZipError> {
        let locator_offset = eocd_offset
            .checked_sub(ZIP64_LOCATOR_SIZE as u64)
            .ok_or_else(|| ZipError::invalid("missing ZIP64 locator"))?;
        let mut locator = [0u8; ZIP64_LOCATOR_SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator).await?;
        let eocd64_offset = decode_zip64_locator(&locator)?;

        self.check_range(eocd64_offset, ZIP64_EOCD_SIZE as u64, "ZIP64 EOCD")?;
        let mut eocd64 = [0u8; ZIP64_EOCD_SIZE];
        self.reader.read_exact_at(eocd64_offset, &mut eocd64).await?;
        decode_zip64_eocd(&eocd64)
    }

    /// Read every central directory record, in stored order.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ZipError> {
        let (eocd, eocd_offset) = self.find_eocd().await?;
        let location = match eocd.location {
            Some(location) => location,
            None => self.read_zip64_location(eocd_offset).await?,
        };
        let DirectoryLocation {
            offset,
            size,
            entries: total_entries,
        } = location;

        self.check_range(offset, size, "central directory")?;
        if total_entries.saturating_mul(CDFH_MIN_SIZE as u64) > size {
            return Err(ZipError::invalid(format!(
                "central directory of {size} bytes cannot hold {total_entries} entries"
            )));
        }

        // One read for the whole directory
        let mut cd_data = vec![0u8; size as usize];
        self.reader.read_exact_at(offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset of an entry's compressed data.
    ///
    /// The local header's name and extra field lengths can differ from the
    /// central directory copy, so the local header is read every time.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64, ZipError> {
        self.check_range(entry.lfh_offset, LFH_SIZE as u64, "local file header")?;
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;

        expect_record(&lfh_buf, LFH_SIGNATURE, LFH_SIZE, "local file header")?;

        let name_len = u64::from(u16::from_le_bytes([lfh_buf[26], lfh_buf[27]]));
        let extra_len = u64::from(u16::from_le_bytes([lfh_buf[28], lfh_buf[29]]));
        let data_offset = entry.lfh_offset + LFH_SIZE as u64 + name_len + extra_len;

        self.check_range(data_offset, entry.compressed_size, "entry data")?;
        Ok(data_offset)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    fn check_range(&self, offset: u64, len: u64, what: &str) -> Result<(), ZipError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(ZipError::invalid(format!(
                "{what} at {offset}+{len} runs past end of archive ({} bytes)",
                self.size
            ))),
        }
    }
}

/// Parse one Central Directory File Header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ZipError> {
    let mut fixed = [0u8; CDFH_MIN_SIZE];
    cursor
        .read_exact(&mut fixed)
        .map_err(|_| ZipError::invalid("truncated central directory"))?;
    expect_record(&fixed, CDFH_SIGNATURE, CDFH_MIN_SIZE, "central directory file header")?;

    let mut header = Cursor::new(&fixed[10..]);
    let compression_method = header.read_u16::<LittleEndian>()?;
    // mod time, mod date, crc32
    header.set_position(header.position() + 8);
    let mut compressed_size = u64::from(header.read_u32::<LittleEndian>()?);
    let mut uncompressed_size = u64::from(header.read_u32::<LittleEndian>()?);
    let name_len = header.read_u16::<LittleEndian>()? as usize;
    let extra_len = header.read_u16::<LittleEndian>()? as usize;
    let comment_len = header.read_u16::<LittleEndian>()? as usize;
    // disk start, internal attrs, external attrs
    header.set_position(header.position() + 8);
    let mut lfh_offset = u64::from(header.read_u32::<LittleEndian>()?);

    let mut name_bytes = vec![0u8; name_len];
    let mut extra = vec![0u8; extra_len];
    cursor
        .read_exact(&mut name_bytes)
        .and_then(|()| cursor.read_exact(&mut extra))
        .map_err(|_| ZipError::invalid("truncated central directory entry"))?;
    cursor.set_position(cursor.position() + comment_len as u64);

    // Non-UTF-8 names are kept readable rather than rejected
    let file_name = String::from_utf8_lossy(&name_bytes).into_owned();

    // ZIP64 extended information (id 0x0001) carries only the fields whose
    // 32-bit slot is saturated, in this order.
    let mut extra = Cursor::new(extra.as_slice());
    while extra.get_ref().len() as u64 - extra.position() >= 4 {
        let header_id = extra.read_u16::<LittleEndian>()?;
        let field_size = u64::from(extra.read_u16::<LittleEndian>()?);
        let field_end = extra.position() + field_size;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                uncompressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                compressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                lfh_offset = extra.read_u64::<LittleEndian>()?;
            }
        }
        extra.set_position(field_end);
    }

    Ok(ZipFileEntry {
        is_directory: file_name.ends_with('/'),
        file_name,
        compression_method: CompressionMethod::from(compression_method),
        compressed_size,
        uncompressed_size,
        lfh_offset,
    })
}
