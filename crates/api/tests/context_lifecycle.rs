//! AppContext wiring and command dispatch over an in-memory backend

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tripline_app::cli::{ListingArgs, PurgeTarget};
use tripline_app::{commands, AppContext, Command};
use tripline_core::fetch::TransportResponse;
use tripline_core::testing::FakeTransport;
use tripline_domain::{TriplineConfig, TriplineError};

fn config(probe_enabled: bool) -> TriplineConfig {
    let mut config = TriplineConfig::default();
    config.api.base_url = "https://api.test/exec".into();
    config.fetch.dispatch_delay_ms = 0;
    config.connectivity.probe_enabled = probe_enabled;
    config
}

fn backend() -> Arc<FakeTransport> {
    FakeTransport::new(|url, _| {
        let endpoint = url.query_pairs().find(|(k, _)| k == "endpoint").map(|(_, v)| v.into_owned());
        let body = match endpoint.as_deref() {
            Some("destinations") => json!({"success": true, "data": [
                {"id": 1, "slug": "lake-toba", "name": "Lake Toba", "category": "nature"},
                {"id": 2, "slug": "medan-old-town", "name": "Medan Old Town", "category": "culture"}
            ]}),
            Some("events") => json!([{"id": "e1", "slug": "toba-festival", "title": "Toba Festival"}]),
            Some("feedback") => json!([{"id": 1, "eventId": "e1", "rating": 5, "comment": "Great"}]),
            _ => json!({"success": true}),
        };
        Ok(TransportResponse::ok(body))
    })
    .into_arc()
}

#[tokio::test]
async fn commands_return_json_and_share_the_runtime() {
    let transport = backend();
    let mut ctx = AppContext::with_transport(config(false), transport.clone()).unwrap();

    let listed = commands::execute(&ctx, &Command::Destinations(ListingArgs::default())).await.unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
    assert_eq!(listed[0]["slug"], "lake-toba");

    let by_slug = ListingArgs { slug: Some("toba-festival".into()), ..ListingArgs::default() };
    let event = commands::execute(&ctx, &Command::Events(by_slug)).await.unwrap();
    assert_eq!(event["title"], "Toba Festival");

    let feedback = commands::execute(&ctx, &Command::Feedback { event_id: "e1".into() }).await.unwrap();
    assert_eq!(feedback[0]["rating"], 5);

    let stats = commands::execute(&ctx, &Command::Stats).await.unwrap();
    assert_eq!(stats["online"], true);
    assert_eq!(stats["performance"]["totalRequests"], 3);
    assert_eq!(stats["destinationsCache"]["size"], 1);
    assert_eq!(stats["eventsCache"]["size"], 2);

    ctx.shutdown().await;
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn blank_search_skips_the_network() {
    let transport = backend();
    let ctx = AppContext::with_transport(config(false), transport.clone()).unwrap();

    let search = ListingArgs { search: Some("   ".into()), ..ListingArgs::default() };
    let found = commands::execute(&ctx, &Command::Destinations(search)).await.unwrap();

    assert_eq!(found, json!([]));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn purge_clears_caches_and_notifies_backend() {
    let transport = backend();
    let ctx = AppContext::with_transport(config(false), transport.clone()).unwrap();
    commands::execute(&ctx, &Command::Destinations(ListingArgs::default())).await.unwrap();

    let purged = commands::execute(&ctx, &Command::Purge { target: PurgeTarget::All }).await.unwrap();

    assert_eq!(purged, json!({"purged": ["destinations", "events"]}));
    assert_eq!(ctx.destinations.cache_stats().size, 0);
    let purge_calls = transport
        .calls()
        .iter()
        .filter(|call| call.url.query_pairs().any(|(k, v)| k == "action" && v == "purge"))
        .count();
    assert_eq!(purge_calls, 2);
}

#[tokio::test(start_paused = true)]
async fn probe_starts_and_stops_with_the_context() {
    let mut ctx = AppContext::with_transport(config(true), backend()).unwrap();

    assert!(ctx.start_probe().unwrap());
    assert!(ctx.probe_running());
    assert!(ctx.start_probe().is_err());

    tokio::time::sleep(Duration::from_millis(10)).await;
    ctx.shutdown().await;
    assert!(!ctx.probe_running());
}

#[tokio::test]
async fn disabled_probe_is_a_no_op() {
    let mut ctx = AppContext::with_transport(config(false), backend()).unwrap();

    assert!(!ctx.start_probe().unwrap());
    assert!(!ctx.probe_running());
}

#[test]
fn invalid_config_is_rejected() {
    let mut bad = config(false);
    bad.fetch.max_concurrent = 0;

    let err = AppContext::with_transport(bad, backend()).unwrap_err();
    assert!(matches!(err, TriplineError::Config(_)));
}
