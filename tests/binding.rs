//! Integration tests for typed binding and file-based settings.

#![allow(unsafe_code)] // For env var manipulation in tests

use hotswap_nacos::prelude::*;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct ServerConfig {
    port: u16,
    host: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct DatabaseConfig {
    url: String,
    max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct AppConfig {
    server: ServerConfig,
    database: DatabaseConfig,
    #[serde(default)]
    features: Vec<String>,
}

fn coordinates(data_id: &str) -> Coordinates {
    Coordinates::new(data_id, DEFAULT_GROUP)
}

#[tokio::test]
async fn test_bind_merged_documents_of_mixed_formats() {
    let service = Arc::new(MemoryConfigService::new());
    service.put_document(
        coordinates("base.yaml"),
        r#"
server:
  port: 8080
  host: localhost
database:
  url: postgres://localhost/db
  max_connections: 10
features:
  - search
  - export
"#,
    );
    service.put_document(
        coordinates("prod.toml"),
        r#"
[server]
host = "0.0.0.0"

[database]
max_connections = 50
"#,
    );
    service.put_document(coordinates("ops.properties"), "server.port=9090");

    let aggregator = Aggregator::start(
        service.clone(),
        vec![
            SourceDescriptor::new("base.yaml"),
            SourceDescriptor::new("prod.toml"),
            SourceDescriptor::new("ops.properties"),
        ],
    )
    .await
    .unwrap();
    aggregator.load().await;

    let config: AppConfig = aggregator.bind().unwrap();
    assert_eq!(
        config,
        AppConfig {
            server: ServerConfig {
                port: 9090,
                host: "0.0.0.0".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/db".to_string(),
                max_connections: 50,
            },
            features: vec!["search".to_string(), "export".to_string()],
        }
    );
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_bind_follows_pushes() {
    let service = Arc::new(MemoryConfigService::new());
    service.put_document(coordinates("server.properties"), "port=8080\nhost=localhost");

    let aggregator = Aggregator::start(
        service.clone(),
        vec![SourceDescriptor::new("server.properties")],
    )
    .await
    .unwrap();
    aggregator.load().await;
    assert_eq!(aggregator.bind::<ServerConfig>().unwrap().port, 8080);

    service
        .publish(coordinates("server.properties"), "port=8081\nhost=localhost")
        .unwrap();
    assert_eq!(aggregator.bind::<ServerConfig>().unwrap().port, 8081);
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_bind_rejects_mismatched_snapshot() {
    let service = Arc::new(MemoryConfigService::new());
    service.put_document(coordinates("server.properties"), "port=eighty\nhost=localhost");

    let aggregator = Aggregator::start(
        service.clone(),
        vec![SourceDescriptor::new("server.properties")],
    )
    .await
    .unwrap();
    aggregator.load().await;

    let result = aggregator.bind::<ServerConfig>();
    assert!(matches!(result, Err(ConfigError::DeserializationError(_))));
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_explicit_format_overrides_extension() {
    let service = Arc::new(MemoryConfigService::new());
    service.put_document(coordinates("server-config"), "port: 7070\nhost: example.org\n");

    let aggregator = Aggregator::start(
        service.clone(),
        vec![SourceDescriptor::new("server-config").with_format(DocumentFormat::Yaml)],
    )
    .await
    .unwrap();
    aggregator.load().await;

    assert_eq!(
        aggregator.bind::<ServerConfig>().unwrap(),
        ServerConfig {
            port: 7070,
            host: "example.org".to_string(),
        }
    );
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_settings_file_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("aggregator.yaml");
    fs::write(
        &settings_path,
        r#"
namespace: prod
fetch_timeout_ms: 1500
sources:
  - data_id: base.properties
  - data_id: scoped.properties
    namespace: eu
  - data_id: extra.json
    group: ops
    optional: true
"#,
    )
    .unwrap();

    let service = Arc::new(MemoryConfigService::new());
    service.put_document(coordinates("base.properties"), "region=none\nport=80");
    service.put_document(coordinates("scoped.properties").in_namespace("eu"), "region=eu");

    let settings = AggregatorSettings::from_file(&settings_path).unwrap();
    assert_eq!(settings.fetch_timeout(), Duration::from_millis(1500));

    let aggregator = settings.into_builder().start(service.clone()).await.unwrap();
    aggregator.try_load().await.unwrap();

    assert_eq!(aggregator.get("region").as_deref(), Some("eu"));
    assert_eq!(aggregator.get("port").as_deref(), Some("80"));
    let keys: Vec<String> = aggregator
        .source_keys()
        .iter()
        .map(|key| key.to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "prod#default_group#base.properties",
            "eu#default_group#scoped.properties",
            "prod#ops#extra.json",
        ]
    );
    aggregator.stop().await.unwrap();
}

#[test]
fn test_settings_environment_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("aggregator.json");
    fs::write(
        &settings_path,
        r#"{ "namespace": "prod", "sources": [ { "data_id": "a.json" } ] }"#,
    )
    .unwrap();

    unsafe {
        std::env::set_var("HNTEST_NAMESPACE", "dev");
        std::env::set_var("HNTEST_FETCH_TIMEOUT_MS", "250");
    }

    let settings = AggregatorSettings::from_file_with_env(&settings_path, "HNTEST").unwrap();

    unsafe {
        std::env::remove_var("HNTEST_NAMESPACE");
        std::env::remove_var("HNTEST_FETCH_TIMEOUT_MS");
    }

    assert_eq!(settings.namespace, "dev");
    assert_eq!(settings.fetch_timeout_ms, 250);
    assert_eq!(settings.sources.len(), 1);
    assert_eq!(settings.sources[0].data_id(), "a.json");
}

#[test]
fn test_settings_reject_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("aggregator.json");
    fs::write(&settings_path, r#"{ "sources": "#).unwrap();

    let result = AggregatorSettings::from_file(&settings_path);
    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}
