//! Core aggregation types.

pub(crate) mod aggregator;
mod binder;
mod builder;
mod cache;
mod descriptor;
mod listener;
mod mapping;
mod merge;

pub use aggregator::Aggregator;
pub use builder::{AggregatorBuilder, DEFAULT_FETCH_TIMEOUT};
pub use cache::SourceCache;
pub use descriptor::{
    Coordinates, DEFAULT_GROUP, DEFAULT_NAMESPACE, DocumentFormat, ResolvedSource,
    SourceDescriptor, SourceKey,
};
pub use listener::ChangeListener;
pub use mapping::{FlatMapping, KEY_DELIMITER};
pub use merge::merge;
