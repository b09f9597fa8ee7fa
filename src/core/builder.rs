//! Builder for constructing Aggregator instances.

use crate::core::{Aggregator, DEFAULT_NAMESPACE, SourceDescriptor};
use crate::error::Result;
use crate::parser::{DocumentParser, FormatParser};
use crate::remote::RemoteConfigService;
use std::sync::Arc;
use std::time::Duration;

/// Per-source fetch deadline used when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(3000);

/// Builder for constructing an [`Aggregator`].
///
/// Provides a fluent interface for the sources, the default namespace, the
/// document parser and the fetch timeout. Sources are merged in the order they
/// are added: later sources override earlier ones.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_nacos::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example(service: Arc<dyn RemoteConfigService>) -> Result<()> {
/// let aggregator = Aggregator::builder()
///     .with_default_namespace("staging")
///     .with_source(SourceDescriptor::new("common.yaml"))
///     .with_source(SourceDescriptor::new("orders.yaml").with_group("SHOP"))
///     .with_source(SourceDescriptor::new("overrides.json").with_optional(true))
///     .with_fetch_timeout(Duration::from_secs(5))
///     .start(service)
///     .await?;
///
/// aggregator.load().await;
/// # Ok(())
/// # }
/// ```
pub struct AggregatorBuilder {
    sources: Vec<SourceDescriptor>,
    default_namespace: String,
    parser: Option<Arc<dyn DocumentParser>>,
    fetch_timeout: Duration,
}

impl AggregatorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            parser: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Add a source. Sources added later win on key collisions.
    pub fn with_source(mut self, source: SourceDescriptor) -> Self {
        self.sources.push(source);
        self
    }

    /// Add several sources in order.
    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = SourceDescriptor>,
    {
        self.sources.extend(sources);
        self
    }

    /// Set the namespace used in source keys for sources that do not name one.
    ///
    /// Default is `public`. Blank values are ignored.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !namespace.trim().is_empty() {
            self.default_namespace = namespace;
        }
        self
    }

    /// Replace the default [`FormatParser`].
    pub fn with_parser<P>(mut self, parser: P) -> Self
    where
        P: DocumentParser + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Set the per-source fetch deadline used by `load`.
    ///
    /// Default is 3 seconds.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Register a change listener for every source and return the aggregator.
    ///
    /// Registrations run concurrently and are all awaited. No document is
    /// fetched yet: call [`Aggregator::load`] for the initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No sources were added ([`ConfigError::EmptySourceSet`](crate::error::ConfigError::EmptySourceSet))
    /// - Two sources resolve to the same key
    /// - The remote service rejects a registration; registrations that
    ///   succeeded are removed again before returning
    pub async fn start(self, client: Arc<dyn RemoteConfigService>) -> Result<Aggregator> {
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(FormatParser::new()));

        Aggregator::launch(
            client,
            self.sources,
            self.default_namespace,
            parser,
            self.fetch_timeout,
        )
        .await
    }

    pub(crate) fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
