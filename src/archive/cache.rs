use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::index::{ArchiveIndex, FileStamp};

/// LRU of opened archive indexes, keyed by archive id.
///
/// An entry is only served while the file's modification time and length
/// match what they were when it was indexed; a mismatch evicts it.
pub struct ArchiveCache {
    entries: Mutex<LruCache<String, (FileStamp, Arc<ArchiveIndex>)>>,
}

impl ArchiveCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, name: &str, stamp: FileStamp) -> Option<Arc<ArchiveIndex>> {
        let mut entries = self.entries.lock();
        let stale = match entries.get(name) {
            Some((cached, index)) if *cached == stamp => return Some(Arc::clone(index)),
            Some(_) => true,
            None => false,
        };
        if stale {
            tracing::debug!(archive = name, "archive changed on disk, evicting");
            entries.pop(name);
        }
        None
    }

    pub fn insert(&self, name: &str, stamp: FileStamp, index: Arc<ArchiveIndex>) {
        self.entries.lock().put(name.to_string(), (stamp, index));
    }
}
