use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::error::ZipError;
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Reads whole entries out of an archive into memory.
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
    max_entry_size: u64,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>, max_entry_size: u64) -> Self {
        Self {
            parser: ZipParser::new(reader),
            max_entry_size,
        }
    }

    /// List all records in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ZipError> {
        self.parser.list_files().await
    }

    /// Decode one entry into memory
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ZipError> {
        if entry.uncompressed_size > self.max_entry_size {
            return Err(ZipError::EntryTooLarge {
                name: entry.file_name.clone(),
                size: entry.uncompressed_size,
                limit: self.max_entry_size,
            });
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                // One byte of headroom so an oversized stream is detected
                // instead of silently truncated.
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size + 1)
                    .read_to_end(&mut out)
                    .map_err(|source| ZipError::Decompress {
                        name: entry.file_name.clone(),
                        source,
                    })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(ZipError::UnsupportedCompression {
                    name: entry.file_name.clone(),
                    method,
                });
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(ZipError::SizeMismatch {
                name: entry.file_name.clone(),
                expected: entry.uncompressed_size,
                actual: data.len() as u64,
            });
        }

        Ok(data)
    }
}
