//! Error types for hotswap-nacos.

/// Result type alias for hotswap-nacos operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when aggregating remote configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An aggregator was started without any configuration sources.
    #[error("No configuration sources specified")]
    EmptySourceSet,

    /// Two source descriptors resolve to the same source key.
    #[error("Duplicate configuration source: {0}")]
    DuplicateSource(String),

    /// Registering a change listener with the remote service failed.
    #[error("Failed to subscribe to {coordinates}: {reason}")]
    SubscribeFailure {
        /// The coordinates of the document being watched
        coordinates: String,
        /// Why the remote service rejected the registration
        reason: String,
    },

    /// Removing a change listener from the remote service failed.
    #[error("Failed to unsubscribe from {coordinates}: {reason}")]
    UnsubscribeFailure {
        /// The coordinates of the document being watched
        coordinates: String,
        /// Why the remote service rejected the removal
        reason: String,
    },

    /// Fetching a document from the remote service failed or timed out.
    #[error("Failed to fetch {coordinates}: {reason}")]
    FetchFailure {
        /// The coordinates of the document being fetched
        coordinates: String,
        /// Why the fetch failed
        reason: String,
    },

    /// A raw document could not be parsed into key/value pairs.
    #[error("Failed to parse configuration: {0}")]
    ParseFailure(String),

    /// The merged snapshot could not be bound to the requested type.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Aggregator settings could not be loaded.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Attempted to use a document format whose feature is not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Create a fetch failure for the given coordinates.
    pub fn fetch(coordinates: impl ToString, reason: impl Into<String>) -> Self {
        Self::FetchFailure {
            coordinates: coordinates.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a parse failure with a message.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseFailure(reason.into())
    }
}
