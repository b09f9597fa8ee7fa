//! Per-source receiver of push notifications.

use crate::core::aggregator::Shared;
use crate::core::{Coordinates, DocumentFormat, ResolvedSource, SourceKey};
use crate::error::Result;
use crate::notify::ReloadEvent;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives pushed documents for one source and republishes the merged snapshot.
///
/// One listener is created per source when an aggregator starts and handed to
/// the remote service, which calls [`receive`](Self::receive) whenever the
/// watched document changes.
pub struct ChangeListener {
    key: SourceKey,
    coordinates: Coordinates,
    format: DocumentFormat,
    optional: bool,
    shared: Arc<Shared>,
}

impl ChangeListener {
    pub(crate) fn new(source: &ResolvedSource, shared: Arc<Shared>) -> Self {
        Self {
            key: source.key().clone(),
            coordinates: source.descriptor().coordinates(),
            format: source.descriptor().format(),
            optional: source.descriptor().is_optional(),
            shared,
        }
    }

    /// Key of the source this listener watches.
    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    /// Coordinates this listener was registered under.
    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Whether failures of this source are tolerated.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Handle a pushed document.
    ///
    /// The document is parsed, cached as this source's latest good document,
    /// every source is re-merged, the new snapshot is published and reload
    /// subscribers are notified once.
    ///
    /// # Errors
    ///
    /// For a required source, a parse or merge failure is returned and the
    /// previous snapshot stays published. For an optional source the failure is
    /// logged and `Ok(())` is returned.
    pub fn receive(&self, document: impl Into<String>) -> Result<()> {
        let document = document.into();
        debug!(source = %self.key, bytes = document.len(), "Received configuration push");

        match self.apply(document) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    source = %self.key,
                    optional = self.optional,
                    error = %e,
                    "Failed to reload configuration from push"
                );
                if self.optional { Ok(()) } else { Err(e) }
            }
        }
    }

    fn apply(&self, document: String) -> Result<()> {
        self.shared.parser.parse(&document, self.format)?;
        self.shared.cache.put(self.key.clone(), document);

        let merged = Arc::new(self.shared.remerge()?);
        self.shared.snapshot.store(Arc::clone(&merged));
        info!(source = %self.key, keys = merged.len(), "Reloaded configuration");

        self.shared.subscribers.notify_all(&ReloadEvent {
            source: self.key.clone(),
            snapshot: merged,
        });
        Ok(())
    }
}

impl fmt::Debug for ChangeListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListener")
            .field("key", &self.key)
            .field("coordinates", &self.coordinates)
            .field("format", &self.format)
            .field("optional", &self.optional)
            .finish()
    }
}
