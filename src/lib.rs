//! # hotswap-nacos
//!
//! Live-reloading aggregation of several remote configuration documents into
//! one lock-free snapshot.
//!
//! ## Overview
//!
//! `hotswap-nacos` watches an ordered list of documents held by a remote
//! configuration service (addressed by data id, group and namespace) and
//! exposes them to the host as a single flat, case-insensitive key/value
//! snapshot:
//! - Lock-free snapshot reads using `arc-swap`
//! - Push-driven re-merges: one changed document republishes the whole snapshot
//! - Later sources override earlier ones on key collisions
//! - Last-known-good documents survive fetch and parse failures
//! - Optional sources whose failures are logged and tolerated
//!
//! ## Quick Start
//!
//! ```rust
//! use hotswap_nacos::prelude::*;
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Deserialize)]
//! struct ServerConfig {
//!     port: u16,
//!     host: String,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     server: ServerConfig,
//! }
//!
//! # async fn example() -> Result<()> {
//! let service = Arc::new(MemoryConfigService::new());
//! service.put_document(
//!     Coordinates::new("base.properties", DEFAULT_GROUP),
//!     "server.port=8080\nserver.host=localhost",
//! );
//! service.put_document(Coordinates::new("prod.properties", DEFAULT_GROUP), "server.port=9090");
//!
//! let aggregator = Aggregator::builder()
//!     .with_source(SourceDescriptor::new("base.properties"))
//!     .with_source(SourceDescriptor::new("prod.properties"))
//!     .start(service.clone())
//!     .await?;
//! aggregator.load().await;
//!
//! let _handle = aggregator.on_reload(|event| {
//!     println!("{} changed, {} keys", event.source, event.snapshot.len());
//! });
//!
//! // A push from the remote service re-merges every source.
//! service.publish(Coordinates::new("prod.properties", DEFAULT_GROUP), "server.port=9191")?;
//!
//! let config: AppConfig = aggregator.bind()?;
//! assert_eq!(config.server.port, 9191);
//!
//! aggregator.stop().await?;
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! Document formats parsed by [`FormatParser`](parser::FormatParser) are
//! gated by features, all enabled by default: `json`, `yaml`, `toml` and
//! `ini`. Java-style `.properties` documents are always supported.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod parser;
pub mod remote;
pub mod settings;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        Aggregator, AggregatorBuilder, Coordinates, DEFAULT_GROUP, DEFAULT_NAMESPACE,
        DocumentFormat, FlatMapping, SourceDescriptor, SourceKey,
    };
    pub use crate::error::{ConfigError, Result};
    pub use crate::notify::{ReloadEvent, SubscriptionHandle};
    pub use crate::parser::{DocumentParser, FormatParser};
    pub use crate::remote::{MemoryConfigService, RemoteConfigService};
    pub use crate::settings::AggregatorSettings;
}
