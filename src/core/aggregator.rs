//! The aggregator: lifecycle, initial load and the published snapshot.

use crate::core::{
    AggregatorBuilder, ChangeListener, Coordinates, FlatMapping, ResolvedSource, SourceCache,
    SourceDescriptor, SourceKey, binder, merge,
};
use crate::error::{ConfigError, Result};
use crate::notify::{ReloadEvent, SubscriberRegistry, SubscriptionHandle};
use crate::parser::DocumentParser;
use crate::remote::RemoteConfigService;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// State shared between the aggregator and its change listeners.
pub(crate) struct Shared {
    pub(crate) sources: Vec<ResolvedSource>,
    pub(crate) cache: SourceCache,
    pub(crate) snapshot: ArcSwap<FlatMapping>,
    pub(crate) parser: Arc<dyn DocumentParser>,
    pub(crate) subscribers: SubscriberRegistry,
}

impl Shared {
    /// Merge every source's cached document in registration order.
    pub(crate) fn remerge(&self) -> Result<FlatMapping> {
        merge(&self.sources, &self.cache, |source, document| {
            self.parser.parse(document, source.descriptor().format())
        })
    }
}

/// One live listener registration with the remote service.
struct Registration {
    coordinates: Coordinates,
    listener: Arc<ChangeListener>,
}

/// Aggregates several remote documents into one live, lock-free snapshot.
///
/// Starting an aggregator registers one [`ChangeListener`] per source with the
/// remote service. [`load`](Self::load) fetches every source and publishes the
/// first snapshot; afterwards, push notifications re-merge all sources and
/// publish a new snapshot without blocking readers.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let service = Arc::new(MemoryConfigService::new());
/// service.put_document(Coordinates::new("base.properties", DEFAULT_GROUP), "port=8080");
/// service.put_document(Coordinates::new("prod.properties", DEFAULT_GROUP), "port=9090");
///
/// let aggregator = Aggregator::builder()
///     .with_source(SourceDescriptor::new("base.properties"))
///     .with_source(SourceDescriptor::new("prod.properties"))
///     .start(service.clone())
///     .await?;
///
/// aggregator.load().await;
/// assert_eq!(aggregator.get("port").as_deref(), Some("9090"));
///
/// aggregator.stop().await?;
/// # Ok(())
/// # }
/// # tokio_test::block_on(example()).unwrap();
/// ```
pub struct Aggregator {
    shared: Arc<Shared>,
    client: Arc<dyn RemoteConfigService>,
    registrations: Mutex<Vec<Registration>>,
    default_namespace: String,
    fetch_timeout: Duration,
}

impl Aggregator {
    /// Create a new builder for constructing an aggregator.
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    /// Start an aggregator over `sources` with default settings.
    ///
    /// Shorthand for `Aggregator::builder().with_sources(sources).start(client)`.
    ///
    /// # Errors
    ///
    /// See [`AggregatorBuilder::start`].
    pub async fn start<I>(client: Arc<dyn RemoteConfigService>, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = SourceDescriptor>,
    {
        Self::builder().with_sources(sources).start(client).await
    }

    pub(crate) async fn launch(
        client: Arc<dyn RemoteConfigService>,
        descriptors: Vec<SourceDescriptor>,
        default_namespace: String,
        parser: Arc<dyn DocumentParser>,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(ConfigError::EmptySourceSet);
        }

        let mut seen = HashSet::with_capacity(descriptors.len());
        let mut sources = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let source = ResolvedSource::new(descriptor, &default_namespace);
            if !seen.insert(source.key().clone()) {
                return Err(ConfigError::DuplicateSource(source.key().to_string()));
            }
            sources.push(source);
        }

        let shared = Arc::new(Shared {
            sources,
            cache: SourceCache::new(),
            snapshot: ArcSwap::from_pointee(FlatMapping::new()),
            parser,
            subscribers: SubscriberRegistry::new(),
        });

        let registrations: Vec<Registration> = shared
            .sources
            .iter()
            .map(|source| Registration {
                coordinates: source.descriptor().coordinates(),
                listener: Arc::new(ChangeListener::new(source, Arc::clone(&shared))),
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (index, registration) in registrations.iter().enumerate() {
            let client = Arc::clone(&client);
            let coordinates = registration.coordinates.clone();
            let listener = Arc::clone(&registration.listener);
            tasks.spawn(async move { (index, client.subscribe(&coordinates, listener).await) });
        }

        let mut subscribed = vec![false; registrations.len()];
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((index, Ok(()))) => {
                    subscribed[index] = true;
                    continue;
                }
                Ok((index, Err(e))) => ConfigError::SubscribeFailure {
                    coordinates: registrations[index].coordinates.to_string(),
                    reason: e.to_string(),
                },
                Err(e) => ConfigError::SubscribeFailure {
                    coordinates: "unknown".to_string(),
                    reason: format!("subscribe task failed: {}", e),
                },
            };
            warn!(error = %failure, "Failed to register configuration listener");
            first_error.get_or_insert(failure);
        }

        if let Some(e) = first_error {
            let succeeded: Vec<Registration> = registrations
                .into_iter()
                .zip(subscribed)
                .filter_map(|(registration, ok)| ok.then_some(registration))
                .collect();
            if !succeeded.is_empty() {
                let rolled_back = succeeded.len();
                if unregister_all(&client, succeeded).await.is_err() {
                    warn!("Some listeners could not be removed while rolling back start");
                } else {
                    debug!(listeners = rolled_back, "Rolled back listener registrations");
                }
            }
            return Err(e);
        }

        info!(
            service = %client.name(),
            sources = registrations.len(),
            "Registered configuration listeners"
        );

        Ok(Self {
            shared,
            client,
            registrations: Mutex::new(registrations),
            default_namespace,
            fetch_timeout,
        })
    }

    /// Fetch every source and publish a freshly merged snapshot.
    ///
    /// Never fails: any error is logged and the previous snapshot stays
    /// published. Use [`try_load`](Self::try_load) to observe the failure.
    /// Reload subscribers are not notified.
    pub async fn load(&self) {
        if let Err(e) = self.try_load().await {
            error!(error = %e, "Failed to load configuration");
        }
    }

    /// Fetch every source and publish a freshly merged snapshot.
    ///
    /// Sources are fetched one after another, each bounded by the fetch
    /// timeout. An optional source that fails is skipped and keeps whatever
    /// it contributed before. A required source that fails aborts the pass
    /// before anything is cached or published.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first required source that could not be
    /// fetched or parsed.
    pub async fn try_load(&self) -> Result<()> {
        let mut fetched = Vec::with_capacity(self.shared.sources.len());

        for source in &self.shared.sources {
            match self.fetch_source(source).await {
                Ok(document) => fetched.push((source.key().clone(), document)),
                Err(e) => {
                    warn!(
                        source = %source,
                        optional = source.descriptor().is_optional(),
                        error = %e,
                        "Failed to query configuration"
                    );
                    if !source.descriptor().is_optional() {
                        return Err(e);
                    }
                }
            }
        }

        let loaded = fetched.len();
        self.shared.cache.put_all(fetched);

        let merged = self.shared.remerge()?;
        info!(
            sources = self.shared.sources.len(),
            loaded,
            keys = merged.len(),
            "Loaded configuration"
        );
        self.shared.snapshot.store(Arc::new(merged));
        Ok(())
    }

    async fn fetch_source(&self, source: &ResolvedSource) -> Result<String> {
        let coordinates = source.descriptor().coordinates();
        let fetch = self.client.fetch(&coordinates, self.fetch_timeout);

        let document = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(document)) => document,
            Ok(Err(e @ ConfigError::FetchFailure { .. })) => return Err(e),
            Ok(Err(e)) => return Err(ConfigError::fetch(&coordinates, e.to_string())),
            Err(_) => {
                return Err(ConfigError::fetch(
                    &coordinates,
                    format!("timed out after {}ms", self.fetch_timeout.as_millis()),
                ));
            }
        };

        self.shared
            .parser
            .parse(&document, source.descriptor().format())?;
        Ok(document)
    }

    /// Remove every listener registration from the remote service.
    ///
    /// All removals run concurrently and are awaited. Registrations are
    /// released even when a removal fails, so calling `stop` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::UnsubscribeFailure`] once every removal
    /// has completed.
    pub async fn stop(&self) -> Result<()> {
        let registrations = std::mem::take(&mut *self.registrations.lock());
        if registrations.is_empty() {
            return Ok(());
        }

        let count = registrations.len();
        unregister_all(&self.client, registrations).await?;
        info!(listeners = count, "Removed all configuration listeners");
        Ok(())
    }

    /// Get a reference-counted handle to the current merged snapshot.
    ///
    /// This is a lock-free read; the returned snapshot never changes.
    pub fn current_snapshot(&self) -> Arc<FlatMapping> {
        self.shared.snapshot.load_full()
    }

    /// Look up one key in the current snapshot, ignoring case.
    pub fn get(&self, key: &str) -> Option<String> {
        self.shared.snapshot.load().get(key).map(str::to_string)
    }

    /// Deserialize the current snapshot into `T`.
    ///
    /// Dotted keys nest (`server.port` fills `server: { port }`) and numeric
    /// segments index arrays.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DeserializationError`] if the snapshot does not
    /// fit `T`.
    pub fn bind<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        binder::bind(&self.current_snapshot())
    }

    /// Subscribe to push-triggered reloads.
    ///
    /// The callback runs after each successful re-merge caused by a push
    /// notification, never for [`load`](Self::load). Drop the handle to
    /// unsubscribe.
    pub fn on_reload<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ReloadEvent) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    /// Namespace used for sources that do not name one.
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Per-source fetch deadline used by [`load`](Self::load).
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Source keys in registration order.
    pub fn source_keys(&self) -> Vec<SourceKey> {
        self.shared
            .sources
            .iter()
            .map(|source| source.key().clone())
            .collect()
    }

    /// Last good raw document cached for a source.
    pub fn cached_document(&self, key: &SourceKey) -> Option<Arc<str>> {
        self.shared.cache.get(key)
    }

    /// Number of listener registrations still live.
    pub fn registration_count(&self) -> usize {
        self.registrations.lock().len()
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        let remaining = self.registrations.get_mut().len();
        if remaining > 0 {
            warn!(
                listeners = remaining,
                "Aggregator dropped without stop(); listeners remain registered"
            );
        }
    }
}

/// Unregister every registration concurrently and wait for all of them.
async fn unregister_all(
    client: &Arc<dyn RemoteConfigService>,
    registrations: Vec<Registration>,
) -> Result<()> {
    let mut tasks = JoinSet::new();
    for registration in registrations {
        let client = Arc::clone(client);
        tasks.spawn(async move {
            client
                .unsubscribe(&registration.coordinates, &registration.listener)
                .await
                .map_err(|e| ConfigError::UnsubscribeFailure {
                    coordinates: registration.coordinates.to_string(),
                    reason: e.to_string(),
                })
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| {
            Err(ConfigError::UnsubscribeFailure {
                coordinates: "unknown".to_string(),
                reason: format!("unsubscribe task failed: {}", e),
            })
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to remove configuration listener");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
