//! Example demonstrating push-driven live reloads across several sources.
//!
//! This example shows how to:
//! - Layer several remote documents into one snapshot
//! - Tolerate a missing optional source
//! - React to pushed changes with a reload subscriber
//! - Bind the merged snapshot to a typed configuration
//!
//! Run with: cargo run --example live_reload

use hotswap_nacos::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct AppConfig {
    server: ServerConfig,
    feature_flags: FeatureFlags,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    port: u16,
    host: String,
}

#[derive(Debug, Deserialize)]
struct FeatureFlags {
    new_ui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Live Reload Example ===\n");

    let service = Arc::new(MemoryConfigService::new());
    service.put_document(
        Coordinates::new("common.yaml", DEFAULT_GROUP),
        "server:\n  port: 8080\n  host: localhost\nfeature_flags:\n  new_ui: false\n",
    );
    service.put_document(
        Coordinates::new("orders.properties", "SHOP"),
        "server.host=orders.internal",
    );

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("common.yaml"))
        .with_source(SourceDescriptor::new("orders.properties").with_group("SHOP"))
        // Nobody has published this one yet.
        .with_source(SourceDescriptor::new("overrides.json").with_optional(true))
        .start(service.clone())
        .await?;

    aggregator.load().await;

    let config: AppConfig = aggregator.bind()?;
    println!("Initial configuration: {:?}\n", config);

    let _handle = aggregator.on_reload(|event| {
        println!(
            "[reload] {} changed, snapshot now has {} keys",
            event.source,
            event.snapshot.len()
        );
    });

    println!("Publishing overrides.json...");
    service.publish(
        Coordinates::new("overrides.json", DEFAULT_GROUP),
        r#"{"server": {"port": 9090}, "feature_flags": {"new_ui": true}}"#,
    )?;

    let config: AppConfig = aggregator.bind()?;
    println!("After push: {:?}\n", config);

    println!("Publishing a broken overrides.json (optional, ignored)...");
    service.publish(Coordinates::new("overrides.json", DEFAULT_GROUP), "{ not json")?;
    println!("Port is still {:?}\n", aggregator.get("server.port"));

    println!("Merged snapshot:");
    for (key, value) in aggregator.current_snapshot().to_sorted_vec() {
        println!("  {} = {}", key, value);
    }

    aggregator.stop().await?;
    println!("\n=== Example Complete ===");

    Ok(())
}
