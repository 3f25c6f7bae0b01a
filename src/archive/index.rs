use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::ArchiveError;
use crate::io::{LocalFileReader, ReadAt};
use crate::resolve::normalize;
use crate::zip::{ZipExtractor, ZipFileEntry};

use super::cache::ArchiveCache;
use super::kind::EntryKind;

/// Default ceiling on a single entry's decoded size.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 256 * 1024 * 1024;

/// One readable file inside an archive.
#[derive(Debug, Clone)]
pub struct Entry {
    path: String,
    kind: EntryKind,
    record: ZipFileEntry,
}

impl Entry {
    /// Canonical internal path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded size in bytes
    pub fn size(&self) -> u64 {
        self.record.uncompressed_size
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

/// Sorted entry table of an opened archive plus the reader to decode them.
///
/// Immutable once built, so a single index can be shared between
/// concurrent requests.
pub struct ArchiveIndex<R: ReadAt = LocalFileReader> {
    name: String,
    extractor: ZipExtractor<R>,
    entries: Vec<Entry>,
}

impl<R: ReadAt> ArchiveIndex<R> {
    /// Parse the central directory of `reader` and build the entry table.
    ///
    /// Directory records are skipped. Names are canonicalized; when two
    /// records canonicalize to the same path the one stored first wins.
    pub async fn build(
        name: impl Into<String>,
        reader: Arc<R>,
        max_entry_size: u64,
    ) -> Result<Self, ArchiveError> {
        let name = name.into();
        let extractor = ZipExtractor::new(reader, max_entry_size);
        let records = extractor
            .list_files()
            .await
            .map_err(|source| ArchiveError::Corrupt {
                name: name.clone(),
                source,
            })?;

        let mut entries: Vec<Entry> = records
            .into_iter()
            .filter(|record| !record.is_directory)
            .filter_map(|record| {
                let path = normalize(&record.file_name);
                (!path.is_empty()).then(|| Entry {
                    kind: EntryKind::from_path(&path),
                    path,
                    record,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|later, first| later.path == first.path);

        tracing::debug!(archive = %name, entries = entries.len(), "indexed archive");

        Ok(Self {
            name,
            extractor,
            entries,
        })
    }

    /// Archive id this index was opened under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries, sorted by canonical path
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Decode the entry at exactly `path`. The path is not normalized.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entry(path)
            .ok_or_else(|| ArchiveError::EntryNotFound {
                archive: self.name.clone(),
                path: path.to_string(),
            })?;

        self.extractor
            .extract_to_memory(&entry.record)
            .await
            .map_err(|source| ArchiveError::Corrupt {
                name: self.name.clone(),
                source,
            })
    }
}

/// Identity of an archive file on disk, used to invalidate cached indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        }
    }
}

/// Directory of archives that the server exposes.
pub struct ArchiveRoot {
    dir: PathBuf,
    cache: Option<Arc<ArchiveCache>>,
    max_entry_size: u64,
}

impl ArchiveRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: None,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }

    /// Reuse opened indexes through `cache`.
    pub fn with_cache(mut self, cache: Arc<ArchiveCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    /// Names of the `.zip` files directly under the root, sorted.
    pub async fn list_archives(&self) -> Result<Vec<String>, ArchiveError> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = item.file_name().into_string() else {
                continue;
            };
            if name.to_ascii_lowercase().ends_with(".zip") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Open (or fetch from cache) the archive called `name`.
    pub async fn open(&self, name: &str) -> Result<Arc<ArchiveIndex>, ArchiveError> {
        let not_found = || ArchiveError::ArchiveNotFound(name.to_string());
        let path = self.archive_path(name).ok_or_else(not_found)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(not_found()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(err.into()),
        };
        let stamp = FileStamp::from_metadata(&metadata);

        if let Some(index) = self.cache.as_ref().and_then(|c| c.get(name, stamp)) {
            tracing::debug!(archive = name, "archive index cache hit");
            return Ok(index);
        }

        let reader = Arc::new(LocalFileReader::new(&path)?);
        let index = Arc::new(ArchiveIndex::build(name, reader, self.max_entry_size).await?);

        if let Some(cache) = &self.cache {
            cache.insert(name, stamp, Arc::clone(&index));
        }
        Ok(index)
    }

    /// Archive ids are bare file names; anything that could step out of the
    /// root is refused.
    fn archive_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return None;
        }
        Some(self.dir.join(name))
    }
}
