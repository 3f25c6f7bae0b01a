//! # zipserve
//!
//! Serves a directory of ZIP archives over HTTP without extracting them.
//!
//! HTML documents inside an archive are rewritten on the way out so that
//! their relative references (images, stylesheets, scripts, links to other
//! pages, CSS `url()` tokens) point back into the same archive through
//! boundary references of the form `/zip_content/<archive>/<path>` or
//! `/view/<archive>/<path>`.
//!
//! ## Features
//!
//! - Central-directory parsing with ZIP64 support
//! - STORED and DEFLATE entries, decompressed into memory with a size cap
//! - Cover selection for gallery thumbnails
//! - Link rewriting that leaves unchanged markup byte-identical
//! - Optional LRU cache of opened archive indexes
//!
//! ## Example
//!
//! ```no_run
//! use zipserve::Library;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let library = Library::open_dir("/srv/books", 16, zipserve::archive::DEFAULT_MAX_ENTRY_SIZE);
//!
//!     for archive in library.list_root_archives().await? {
//!         for document in library.list_documents(&archive).await? {
//!             println!("{archive}: {document}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod boundary;
pub mod cli;
pub mod cover;
pub mod error;
pub mod http;
pub mod io;
pub mod library;
pub mod resolve;
pub mod rewrite;
pub mod zip;

pub use archive::{ArchiveCache, ArchiveIndex, ArchiveRoot, EntryKind};
pub use boundary::{BoundaryRef, Route};
pub use cli::ServerConfig;
pub use error::{ArchiveError, ConfigError, MarkupError, ServerError, ZipError};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use library::{Content, Library};
pub use rewrite::LinkRewriter;
pub use zip::{ZipExtractor, ZipFileEntry};
