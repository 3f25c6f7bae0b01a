//! The operations exposed across the content boundary.
//!
//! Each call opens (or fetches from the injected cache) the archives it
//! needs and keeps no state of its own, so a `Library` can be shared by any
//! number of concurrent requests.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::{ArchiveCache, ArchiveRoot, EntryKind, mime_type};
use crate::cover::select_cover;
use crate::error::ArchiveError;
use crate::rewrite::LinkRewriter;

/// Bytes plus the content type they should be served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl Content {
    fn new(bytes: Vec<u8>, path: &str) -> Self {
        Self {
            bytes,
            mime_type: mime_type(path),
        }
    }
}

/// A directory of archives served through boundary references.
pub struct Library {
    root: ArchiveRoot,
    rewriter: LinkRewriter,
}

impl Library {
    pub fn new(root: ArchiveRoot) -> Self {
        Self {
            root,
            rewriter: LinkRewriter::new(),
        }
    }

    /// Library over `dir`, caching up to `cache_capacity` opened archives
    /// (0 disables caching).
    pub fn open_dir(dir: impl Into<PathBuf>, cache_capacity: usize, max_entry_size: u64) -> Self {
        let mut root = ArchiveRoot::new(dir).with_max_entry_size(max_entry_size);
        if let Some(capacity) = NonZeroUsize::new(cache_capacity) {
            root = root.with_cache(Arc::new(ArchiveCache::new(capacity)));
        }
        Self::new(root)
    }

    /// Archive ids under the root, sorted.
    pub async fn list_root_archives(&self) -> Result<Vec<String>, ArchiveError> {
        self.root.list_archives().await
    }

    /// Cover image of an archive.
    ///
    /// A corrupt archive has no thumbnail rather than an error of its own.
    pub async fn get_thumbnail(&self, archive_id: &str) -> Result<Content, ArchiveError> {
        let index = match self.root.open(archive_id).await {
            Ok(index) => index,
            Err(err @ ArchiveError::Corrupt { .. }) => {
                tracing::warn!(archive = archive_id, error = %err, "no thumbnail for corrupt archive");
                return Err(ArchiveError::NoCover(archive_id.to_string()));
            }
            Err(err) => return Err(err),
        };

        let cover = select_cover(index.entries().iter().map(|e| e.path()))
            .ok_or_else(|| ArchiveError::NoCover(archive_id.to_string()))?;
        let bytes = index.read(cover).await?;
        Ok(Content::new(bytes, cover))
    }

    /// Markup documents inside an archive, in index order.
    pub async fn list_documents(&self, archive_id: &str) -> Result<Vec<String>, ArchiveError> {
        let index = self.root.open(archive_id).await?;
        Ok(index
            .entries()
            .iter()
            .filter(|e| e.kind() == EntryKind::Markup)
            .map(|e| e.path().to_string())
            .collect())
    }

    /// Document text with internal references rewritten to boundary form.
    pub async fn get_rewritten_document(
        &self,
        archive_id: &str,
        internal_path: &str,
    ) -> Result<String, ArchiveError> {
        let index = self.root.open(archive_id).await?;
        let bytes = index.read(internal_path).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(self.rewriter.rewrite(&text, internal_path, archive_id))
    }

    /// Entry bytes exactly as stored.
    pub async fn get_raw_content(
        &self,
        archive_id: &str,
        internal_path: &str,
    ) -> Result<Content, ArchiveError> {
        let index = self.root.open(archive_id).await?;
        let bytes = index.read(internal_path).await?;
        Ok(Content::new(bytes, internal_path))
    }

    /// Document-view retrieval: markup is rewritten, anything else is
    /// served raw.
    pub async fn view(&self, archive_id: &str, internal_path: &str) -> Result<Content, ArchiveError> {
        if EntryKind::from_path(internal_path) != EntryKind::Markup {
            return self.get_raw_content(archive_id, internal_path).await;
        }
        let text = self.get_rewritten_document(archive_id, internal_path).await?;
        Ok(Content::new(text.into_bytes(), internal_path))
    }
}
