//! Last-known-good raw documents, one per source.

use crate::core::SourceKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent mapping from source key to the last good raw document.
///
/// Entries are replaced whole on write; readers receive an `Arc<str>` and never
/// observe a partially written document.
#[derive(Debug, Default)]
pub struct SourceCache {
    documents: RwLock<HashMap<SourceKey, Arc<str>>>,
}

impl SourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document for a source, if one was ever stored.
    pub fn get(&self, key: &SourceKey) -> Option<Arc<str>> {
        self.documents.read().get(key).cloned()
    }

    /// Replace the document for a source, returning the previous one.
    pub fn put(&self, key: SourceKey, document: impl Into<Arc<str>>) -> Option<Arc<str>> {
        self.documents.write().insert(key, document.into())
    }

    /// Replace several documents under a single write lock.
    pub fn put_all<I, D>(&self, documents: I)
    where
        I: IntoIterator<Item = (SourceKey, D)>,
        D: Into<Arc<str>>,
    {
        let mut guard = self.documents.write();
        for (key, document) in documents {
            guard.insert(key, document.into());
        }
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether no document has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}
