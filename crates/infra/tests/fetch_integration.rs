//! Services over the reqwest transport against wiremock backends

use std::sync::Arc;

use serde_json::{json, Map};
use tripline_core::fetch::{Endpoints, FetchRuntime, ServicePolicy};
use tripline_core::DestinationService;
use tripline_domain::{FetchError, RequestStatus, RetrySettings, TransactionRequest, TriplineConfig, TriplineError};
use tripline_infra::{HttpClient, PerformanceMonitor};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAST_RETRY: RetrySettings = RetrySettings { max_retries: 1, base_delay_ms: 10, max_jitter_ms: 0, max_delay_ms: 50 };

struct Harness {
    destinations: DestinationService,
    monitor: Arc<PerformanceMonitor>,
}

fn harness(primary: &MockServer, fallbacks: &[&MockServer]) -> Harness {
    let mut config = TriplineConfig::default();
    config.api.base_url = format!("{}/api", primary.uri());
    config.api.fallback_urls = fallbacks.iter().map(|server| format!("{}/api", server.uri())).collect();
    config.fetch.dispatch_delay_ms = 0;
    config.fetch.timeout_ms = 1_000;
    config.fetch.read_retry = FAST_RETRY;
    config.fetch.write_retry = FAST_RETRY;
    config.validate().unwrap();

    let monitor = Arc::new(PerformanceMonitor::new());
    let transport = Arc::new(HttpClient::from_config(&config.api, &config.fetch).unwrap());
    let runtime = FetchRuntime::builder(transport, Endpoints::from_config(&config.api).unwrap())
        .fetch_config(&config.fetch)
        .observer(monitor.clone())
        .build()
        .unwrap();

    Harness {
        destinations: DestinationService::new(
            Arc::new(runtime),
            ServicePolicy::from_config(&config, &config.destinations),
        ),
        monitor,
    }
}

fn booking() -> TransactionRequest {
    TransactionRequest {
        customer_name: "Ana".into(),
        customer_email: "ana@example.com".into(),
        customer_phone: None,
        items: vec![json!({"destinationId": 1, "quantity": 2})],
        total: 300_000.0,
        extra: Map::new(),
    }
}

#[tokio::test]
async fn list_is_fetched_once_then_served_from_cache() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("endpoint", "destinations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "slug": "lake-toba", "name": "Lake Toba", "price": "150000"},
                {"id": 2, "slug": "bukit-lawang", "name": "Bukit Lawang"}
            ]
        })))
        .expect(1)
        .mount(&primary)
        .await;

    let h = harness(&primary, &[]);

    let first = h.destinations.fetch_destinations().await.unwrap();
    let second = h.destinations.fetch_destinations().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].price, Some(150_000.0));
    assert_eq!(h.destinations.cache_stats().size, 1);

    let stats = h.monitor.get_stats();
    assert_eq!(stats.total_requests, 1);
    assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn fallback_serves_after_primary_exhausts_retries() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).expect(2).mount(&primary).await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "destinations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 9, "slug": "samosir"}])))
        .expect(1)
        .mount(&fallback)
        .await;

    let h = harness(&primary, &[&fallback]);
    let destinations = h.destinations.fetch_destinations().await.unwrap();

    assert_eq!(destinations[0].slug, "samosir");
    let statuses: Vec<RequestStatus> = h.monitor.recent(10).iter().rev().map(|m| m.status).collect();
    assert_eq!(statuses, vec![RequestStatus::Http(503), RequestStatus::Http(503), RequestStatus::Http(200)]);
    assert_eq!(h.monitor.get_stats().failed_requests, 2);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("slug", "atlantis"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such destination"})))
        .expect(1)
        .mount(&primary)
        .await;

    let h = harness(&primary, &[]);
    let err = h.destinations.fetch_destination_by_slug("atlantis").await.unwrap_err();

    match err {
        TriplineError::Fetch(fetch) => {
            assert_eq!(fetch.status(), Some(404));
            assert!(fetch.to_string().contains("no such destination"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn writes_go_to_primary_only() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("endpoint", "transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": 77})))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&fallback).await;

    let h = harness(&primary, &[&fallback]);
    let receipt = h.destinations.create_transaction(&booking()).await.unwrap();

    assert!(receipt.success);
    assert_eq!(receipt.id.as_deref(), Some("77"));

    let requests = primary.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["customerName"], "Ana");
    assert_eq!(sent["total"], 300_000.0);
}

#[tokio::test]
async fn failing_write_exhausts_its_budget_on_primary() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(2).mount(&primary).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&fallback).await;

    let h = harness(&primary, &[&fallback]);
    let err = h.destinations.create_transaction(&booking()).await.unwrap_err();

    assert!(matches!(err, TriplineError::Fetch(FetchError::Api { status: Some(500), .. })));
}

#[tokio::test]
async fn rejected_write_surfaces_backend_message() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Sold out"})))
        .expect(1)
        .mount(&primary)
        .await;

    let h = harness(&primary, &[]);
    let err = h.destinations.create_transaction(&booking()).await.unwrap_err();

    assert_eq!(err, TriplineError::Fetch(FetchError::Rejected { message: "Sold out".into() }));
}
