//! Remote configuration service contract.
//!
//! The aggregator never talks to the network itself: it drives an implementation
//! of [`RemoteConfigService`]. [`MemoryConfigService`] is an in-process
//! implementation for tests, benches and local development.

mod memory;

pub use memory::MemoryConfigService;

use crate::core::{ChangeListener, Coordinates};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Subscribe/fetch/unsubscribe primitives of a remote configuration service.
///
/// `coordinates.namespace` is `None` when the document is addressed without a
/// namespace; implementations apply their own default in that case. After a
/// successful [`subscribe`](Self::subscribe) the service calls
/// [`ChangeListener::receive`] from its own task or thread whenever the watched
/// document changes.
#[async_trait]
pub trait RemoteConfigService: Send + Sync {
    /// Register `listener` for changes to the document at `coordinates`.
    async fn subscribe(&self, coordinates: &Coordinates, listener: Arc<ChangeListener>) -> Result<()>;

    /// Remove a listener previously registered for `coordinates`.
    async fn unsubscribe(&self, coordinates: &Coordinates, listener: &Arc<ChangeListener>)
    -> Result<()>;

    /// Fetch the current text of the document at `coordinates`.
    ///
    /// `timeout` is the caller's deadline; the aggregator enforces it as well.
    async fn fetch(&self, coordinates: &Coordinates, timeout: Duration) -> Result<String>;

    /// Get a human-readable name for this service (for logging/debugging).
    fn name(&self) -> String {
        "remote".to_string()
    }
}
