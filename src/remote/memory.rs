//! In-process remote configuration service.

use super::RemoteConfigService;
use crate::core::{ChangeListener, Coordinates};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct State {
    documents: HashMap<Coordinates, String>,
    listeners: HashMap<Coordinates, Vec<Arc<ChangeListener>>>,
    failing_fetches: HashSet<Coordinates>,
    failing_subscribes: HashSet<Coordinates>,
    failing_unsubscribes: HashSet<Coordinates>,
    subscribe_calls: Vec<Coordinates>,
    unsubscribe_calls: Vec<Coordinates>,
    fetch_count: usize,
    fetch_delay: Option<Duration>,
}

/// A remote configuration service living entirely in memory.
///
/// Documents are addressed by exact [`Coordinates`], so a document stored
/// without a namespace is distinct from the same data id in an explicit
/// namespace. [`publish`](Self::publish) behaves like a server-side edit: the
/// document is stored and every subscribed listener receives it, provided the
/// content actually changed.
///
/// Failures and latency can be injected per coordinate to exercise the
/// aggregator's fault handling.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::Coordinates;
/// use hotswap_nacos::remote::MemoryConfigService;
///
/// let service = MemoryConfigService::new();
/// let coordinates = Coordinates::new("app.properties", "DEFAULT_GROUP");
/// service.put_document(coordinates.clone(), "greeting=hello");
///
/// // No listeners yet, nothing is delivered.
/// assert_eq!(service.publish(coordinates, "greeting=hi").unwrap(), 0);
/// ```
#[derive(Default)]
pub struct MemoryConfigService {
    state: Mutex<State>,
}

impl MemoryConfigService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document without notifying listeners.
    pub fn put_document(&self, coordinates: Coordinates, document: impl Into<String>) {
        self.state.lock().documents.insert(coordinates, document.into());
    }

    /// Delete a document; later fetches fail until it is stored again.
    pub fn remove_document(&self, coordinates: &Coordinates) {
        self.state.lock().documents.remove(coordinates);
    }

    /// Store a document and push it to every listener of `coordinates`.
    ///
    /// Returns the number of listeners notified; nothing is delivered when the
    /// content is unchanged. Every listener is called even if one fails; the
    /// first failure is returned afterwards.
    pub fn publish(&self, coordinates: Coordinates, document: impl Into<String>) -> Result<usize> {
        let document = document.into();
        let listeners = {
            let mut state = self.state.lock();
            if state.documents.get(&coordinates) == Some(&document) {
                return Ok(0);
            }
            state.documents.insert(coordinates.clone(), document.clone());
            state
                .listeners
                .get(&coordinates)
                .cloned()
                .unwrap_or_default()
        };

        debug!(%coordinates, listeners = listeners.len(), "Delivering published document");

        let mut first_error = None;
        for listener in &listeners {
            if let Err(e) = listener.receive(document.clone()) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(listeners.len()),
        }
    }

    /// Make fetches of `coordinates` fail (or succeed again).
    pub fn set_fetch_failure(&self, coordinates: Coordinates, failing: bool) {
        toggle(&mut self.state.lock().failing_fetches, coordinates, failing);
    }

    /// Make subscriptions to `coordinates` fail (or succeed again).
    pub fn set_subscribe_failure(&self, coordinates: Coordinates, failing: bool) {
        toggle(&mut self.state.lock().failing_subscribes, coordinates, failing);
    }

    /// Make unsubscriptions from `coordinates` fail (or succeed again).
    pub fn set_unsubscribe_failure(&self, coordinates: Coordinates, failing: bool) {
        toggle(&mut self.state.lock().failing_unsubscribes, coordinates, failing);
    }

    /// Delay every fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.state.lock().fetch_delay = delay;
    }

    /// Number of listeners currently registered for `coordinates`.
    pub fn listener_count(&self, coordinates: &Coordinates) -> usize {
        self.state
            .lock()
            .listeners
            .get(coordinates)
            .map_or(0, Vec::len)
    }

    /// Number of listeners registered across all coordinates.
    pub fn total_listeners(&self) -> usize {
        self.state.lock().listeners.values().map(Vec::len).sum()
    }

    /// Coordinates of every subscribe call received, in order.
    pub fn subscribe_calls(&self) -> Vec<Coordinates> {
        self.state.lock().subscribe_calls.clone()
    }

    /// Coordinates of every unsubscribe call received, in order.
    pub fn unsubscribe_calls(&self) -> Vec<Coordinates> {
        self.state.lock().unsubscribe_calls.clone()
    }

    /// Number of fetch calls received.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetch_count
    }
}

fn toggle(set: &mut HashSet<Coordinates>, coordinates: Coordinates, enabled: bool) {
    if enabled {
        set.insert(coordinates);
    } else {
        set.remove(&coordinates);
    }
}

#[async_trait]
impl RemoteConfigService for MemoryConfigService {
    async fn subscribe(&self, coordinates: &Coordinates, listener: Arc<ChangeListener>) -> Result<()> {
        let mut state = self.state.lock();
        state.subscribe_calls.push(coordinates.clone());
        if state.failing_subscribes.contains(coordinates) {
            return Err(ConfigError::Other("injected subscribe failure".to_string()));
        }
        state
            .listeners
            .entry(coordinates.clone())
            .or_default()
            .push(listener);
        Ok(())
    }

    async fn unsubscribe(
        &self,
        coordinates: &Coordinates,
        listener: &Arc<ChangeListener>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.unsubscribe_calls.push(coordinates.clone());
        if state.failing_unsubscribes.contains(coordinates) {
            return Err(ConfigError::Other("injected unsubscribe failure".to_string()));
        }
        let now_empty = match state.listeners.get_mut(coordinates) {
            Some(listeners) => {
                listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
                listeners.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.listeners.remove(coordinates);
        }
        Ok(())
    }

    async fn fetch(&self, coordinates: &Coordinates, _timeout: Duration) -> Result<String> {
        let (delay, outcome) = {
            let mut state = self.state.lock();
            state.fetch_count += 1;
            let outcome = if state.failing_fetches.contains(coordinates) {
                Err(ConfigError::fetch(coordinates, "injected fetch failure"))
            } else {
                state
                    .documents
                    .get(coordinates)
                    .cloned()
                    .ok_or_else(|| ConfigError::fetch(coordinates, "document not found"))
            };
            (state.fetch_delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
