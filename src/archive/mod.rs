//! Archive index: open archives from the configured root, list their
//! entries and read entry bytes.

mod cache;
mod index;
pub mod kind;

pub use cache::ArchiveCache;
pub use index::{ArchiveIndex, ArchiveRoot, DEFAULT_MAX_ENTRY_SIZE, Entry, FileStamp};
pub use kind::{EntryKind, mime_type};
