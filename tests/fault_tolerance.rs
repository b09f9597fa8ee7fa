//! Integration tests for fetch, parse and push failures.

use hotswap_nacos::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn coordinates(data_id: &str) -> Coordinates {
    Coordinates::new(data_id, DEFAULT_GROUP)
}

fn service_with(documents: &[(&str, &str)]) -> Arc<MemoryConfigService> {
    let service = Arc::new(MemoryConfigService::new());
    for (data_id, document) in documents {
        service.put_document(coordinates(data_id), *document);
    }
    service
}

#[tokio::test]
async fn test_optional_fetch_failure_is_tolerated() {
    // a.properties is never stored, so its fetch fails.
    let service = service_with(&[("b.properties", "k2=v2")]);

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("a.properties").with_optional(true))
        .with_source(SourceDescriptor::new("b.properties"))
        .start(service.clone())
        .await
        .unwrap();

    aggregator.try_load().await.unwrap();

    let snapshot = aggregator.current_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("k2"), Some("v2"));
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_required_failure_leaves_snapshot_absent() {
    let service = service_with(&[("b.properties", "k2=v2")]);

    let aggregator = Aggregator::start(
        service.clone(),
        vec![
            SourceDescriptor::new("a.properties"),
            SourceDescriptor::new("b.properties"),
        ],
    )
    .await
    .unwrap();

    // load swallows the failure.
    aggregator.load().await;
    assert!(aggregator.current_snapshot().is_empty());

    let result = aggregator.try_load().await;
    assert!(matches!(result, Err(ConfigError::FetchFailure { .. })));
    assert!(aggregator.current_snapshot().is_empty());
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_required_failure_preserves_previous_snapshot() {
    let service = service_with(&[("a.properties", "k1=v1"), ("b.properties", "k2=v2")]);

    let aggregator = Aggregator::start(
        service.clone(),
        vec![
            SourceDescriptor::new("a.properties"),
            SourceDescriptor::new("b.properties"),
        ],
    )
    .await
    .unwrap();
    aggregator.load().await;
    let before = aggregator.current_snapshot();

    service.set_fetch_failure(coordinates("a.properties"), true);
    service.put_document(coordinates("b.properties"), "k2=changed");
    aggregator.load().await;

    // The pass aborted before anything was cached, so b's change is not seen.
    assert_eq!(*aggregator.current_snapshot(), *before);
    assert_eq!(aggregator.get("k2").as_deref(), Some("v2"));
    let keys = aggregator.source_keys();
    assert_eq!(aggregator.cached_document(&keys[1]).as_deref(), Some("k2=v2"));

    service.set_fetch_failure(coordinates("a.properties"), false);
    aggregator.load().await;
    assert_eq!(aggregator.get("k2").as_deref(), Some("changed"));
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_optional_source_keeps_last_good_contribution() {
    let service = service_with(&[("a.properties", "shared=a\nonly_a=1"), ("b.properties", "k=v")]);

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("a.properties").with_optional(true))
        .with_source(SourceDescriptor::new("b.properties"))
        .start(service.clone())
        .await
        .unwrap();
    aggregator.load().await;
    assert_eq!(aggregator.get("only_a").as_deref(), Some("1"));

    service.set_fetch_failure(coordinates("a.properties"), true);
    aggregator.try_load().await.unwrap();
    aggregator.try_load().await.unwrap();

    assert_eq!(aggregator.get("only_a").as_deref(), Some("1"));
    assert_eq!(aggregator.get("shared").as_deref(), Some("a"));
    aggregator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_is_a_fetch_failure() {
    let service = service_with(&[("slow.properties", "k=v")]);
    service.set_fetch_delay(Some(Duration::from_millis(500)));

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("slow.properties"))
        .with_fetch_timeout(Duration::from_millis(50))
        .start(service.clone())
        .await
        .unwrap();

    match aggregator.try_load().await {
        Err(ConfigError::FetchFailure { reason, .. }) => assert!(reason.contains("timed out")),
        other => panic!("expected a fetch timeout, got {:?}", other),
    }
    assert!(aggregator.current_snapshot().is_empty());

    service.set_fetch_delay(Some(Duration::from_millis(10)));
    aggregator.try_load().await.unwrap();
    assert_eq!(aggregator.get("k").as_deref(), Some("v"));
    aggregator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_optional_fetch_timeout_is_skipped() {
    let service = service_with(&[("slow.properties", "k=slow")]);
    service.set_fetch_delay(Some(Duration::from_millis(500)));

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("slow.properties").with_optional(true))
        .with_fetch_timeout(Duration::from_millis(50))
        .start(service.clone())
        .await
        .unwrap();

    aggregator.try_load().await.unwrap();
    assert!(aggregator.current_snapshot().is_empty());
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_parse_failure_on_load_caches_nothing() {
    let service = service_with(&[("a.properties", "k=v"), ("b.properties", "this line is broken")]);

    let aggregator = Aggregator::start(
        service.clone(),
        vec![
            SourceDescriptor::new("a.properties"),
            SourceDescriptor::new("b.properties"),
        ],
    )
    .await
    .unwrap();

    let result = aggregator.try_load().await;
    assert!(matches!(result, Err(ConfigError::ParseFailure(_))));

    for key in aggregator.source_keys() {
        assert!(aggregator.cached_document(&key).is_none());
    }
    assert!(aggregator.current_snapshot().is_empty());
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_optional_push_parse_failure_is_dropped() {
    let service = service_with(&[("a.properties", "k1=v1"), ("b.properties", "k2=v2")]);

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("a.properties"))
        .with_source(SourceDescriptor::new("b.properties").with_optional(true))
        .start(service.clone())
        .await
        .unwrap();
    aggregator.load().await;

    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reloads);
    let _handle = aggregator.on_reload(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let before = aggregator.current_snapshot();
    let delivered = service
        .publish(coordinates("b.properties"), "no separator here")
        .unwrap();

    assert_eq!(delivered, 1);
    assert_eq!(reloads.load(Ordering::SeqCst), 0);
    assert_eq!(*aggregator.current_snapshot(), *before);
    let keys = aggregator.source_keys();
    assert_eq!(aggregator.cached_document(&keys[1]).as_deref(), Some("k2=v2"));
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_required_push_parse_failure_surfaces() {
    let service = service_with(&[("a.properties", "k1=v1"), ("b.properties", "k2=v2")]);

    let aggregator = Aggregator::start(
        service.clone(),
        vec![
            SourceDescriptor::new("a.properties"),
            SourceDescriptor::new("b.properties"),
        ],
    )
    .await
    .unwrap();
    aggregator.load().await;

    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reloads);
    let _handle = aggregator.on_reload(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let before = aggregator.current_snapshot();
    let result = service.publish(coordinates("b.properties"), "no separator here");

    assert!(matches!(result, Err(ConfigError::ParseFailure(_))));
    assert_eq!(reloads.load(Ordering::SeqCst), 0);
    assert_eq!(*aggregator.current_snapshot(), *before);

    // A later good push recovers.
    service
        .publish(coordinates("b.properties"), "k2=fixed")
        .unwrap();
    assert_eq!(aggregator.get("k2").as_deref(), Some("fixed"));
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
    aggregator.stop().await.unwrap();
}

#[tokio::test]
async fn test_bad_document_in_one_format_does_not_affect_others() {
    let service = service_with(&[
        ("good.json", r#"{"db": {"pool": 8}}"#),
        ("bad.json", r#"{"db": "#),
    ]);

    let aggregator = Aggregator::builder()
        .with_source(SourceDescriptor::new("good.json"))
        .with_source(SourceDescriptor::new("bad.json").with_optional(true))
        .start(service.clone())
        .await
        .unwrap();

    aggregator.try_load().await.unwrap();
    assert_eq!(aggregator.get("db.pool").as_deref(), Some("8"));
    assert!(aggregator.cached_document(&aggregator.source_keys()[1]).is_none());
    aggregator.stop().await.unwrap();
}
