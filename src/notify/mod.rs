//! Reload notifications.
//!
//! Hosts subscribe here to learn when a push notification has produced a new
//! merged snapshot.

pub mod subscriber;

pub use subscriber::{ReloadEvent, SubscriberRegistry, SubscriptionHandle};
