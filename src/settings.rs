//! File-based description of an aggregator.

use crate::core::{AggregatorBuilder, DEFAULT_NAMESPACE, SourceDescriptor};
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    3000
}

/// Sources, default namespace and fetch timeout for one aggregator.
///
/// # Examples
///
/// A YAML settings file:
///
/// ```yaml
/// namespace: staging
/// fetch_timeout_ms: 5000
/// sources:
///   - data_id: common.yaml
///   - data_id: orders.properties
///     group: SHOP
///   - data_id: overrides.json
///     optional: true
/// ```
///
/// ```rust,no_run
/// use hotswap_nacos::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example(service: Arc<dyn RemoteConfigService>) -> Result<()> {
/// let aggregator = AggregatorSettings::from_file_with_env("config/aggregator.yaml", "AGG")?
///     .into_builder()
///     .start(service)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorSettings {
    /// Namespace for sources that do not name one.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Sources in merge order.
    #[serde(default, alias = "listeners")]
    pub sources: Vec<SourceDescriptor>,

    /// Per-source fetch deadline in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl AggregatorSettings {
    /// Load settings from a file. The format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadError`] if the file is missing or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(config::Config::builder().add_source(config::File::from(path.as_ref())))
    }

    /// Load settings from a file, then apply `PREFIX_*` environment overrides.
    ///
    /// `AGG_NAMESPACE=dev` overrides `namespace` and
    /// `AGG_FETCH_TIMEOUT_MS=500` overrides `fetch_timeout_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadError`] if the file is missing or malformed.
    pub fn from_file_with_env(path: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let environment = config::Environment::with_prefix(prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        Self::load(
            config::Config::builder()
                .add_source(config::File::from(path.as_ref()))
                .add_source(environment),
        )
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to read settings: {}", e)))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError(format!("Invalid settings: {}", e)))
    }

    /// Per-source fetch deadline.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Turn the settings into a builder, ready to [`start`](AggregatorBuilder::start).
    pub fn into_builder(self) -> AggregatorBuilder {
        AggregatorBuilder::new()
            .with_default_namespace(self.namespace.clone())
            .with_fetch_timeout(self.fetch_timeout())
            .with_sources(self.sources)
    }
}
