//! Error types for zipserve.
//!
//! Each layer has its own `thiserror` enum. Only the binary reaches for
//! `anyhow`.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing or decoding a ZIP container.
#[derive(Debug, Error)]
pub enum ZipError {
    /// Underlying read failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A structure is missing, truncated or carries a bad signature
    #[error("invalid ZIP structure: {0}")]
    InvalidFormat(String),

    /// Entry uses a compression method other than STORED or DEFLATE
    #[error("unsupported compression method {method} for {name}")]
    UnsupportedCompression {
        /// Entry name
        name: String,
        /// Raw method id from the header
        method: u16,
    },

    /// DEFLATE stream could not be decoded
    #[error("failed to inflate {name}: {source}")]
    Decompress {
        /// Entry name
        name: String,
        /// Decoder error
        #[source]
        source: std::io::Error,
    },

    /// Decoded length disagrees with the central directory
    #[error("size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Entry name
        name: String,
        /// Declared uncompressed size
        expected: u64,
        /// Bytes actually produced
        actual: u64,
    },

    /// Declared size is over the configured limit
    #[error("entry {name} is too large: {size} bytes (limit {limit})")]
    EntryTooLarge {
        /// Entry name
        name: String,
        /// Declared uncompressed size
        size: u64,
        /// Configured limit
        limit: u64,
    },
}

impl ZipError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}

/// Errors surfaced by the archive index and the library operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No archive with this name under the configured root
    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    /// Archive exists but has no entry at this exact path
    #[error("entry not found in {archive}: {path}")]
    EntryNotFound {
        /// Archive id
        archive: String,
        /// Internal path that missed
        path: String,
    },

    /// Archive has no image entry to use as a thumbnail
    #[error("no cover image in {0}")]
    NoCover(String),

    /// Archive or one of its entries could not be decoded
    #[error("corrupt archive {name}: {source}")]
    Corrupt {
        /// Archive id
        name: String,
        /// Decoding failure
        #[source]
        source: ZipError,
    },

    /// Filesystem failure outside of archive decoding
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Whether the boundary layer should answer with a missing-resource
    /// response.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Markup could not be parsed or written back.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Tokenizer rejected the input
    #[error("markup parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset reported by the tokenizer
        position: u64,
        /// Tokenizer message
        message: String,
    },

    /// Serializer failed
    #[error("markup serialize error: {0}")]
    Serialize(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Archive root is missing or not a directory
    #[error("archive root {0} is not a directory")]
    RootNotDirectory(PathBuf),
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind HTTP server
    #[error("failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Server stopped with an error
    #[error("server shutdown: {0}")]
    Shutdown(String),
}
