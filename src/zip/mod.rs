//! ZIP container parsing and entry decoding.
//!
//! - [`structures`]: fixed-layout records (EOCD, ZIP64 records, headers)
//! - [`parser`]: locating and decoding the central directory
//! - [`extractor`]: reading a single entry into memory
//!
//! The central directory is read from the end of the file first, so listing
//! an archive never touches entry data.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 sizes and offsets
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

#[cfg(test)]
pub(crate) mod fixture;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::{CompressionMethod, ZipFileEntry};
