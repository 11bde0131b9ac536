//! Trigger surface scenario tests.
//!
//! Each test drives the real fetcher and notifier against local mock feed and
//! webhook servers, through the axum router.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use common::{item, rss_document, MockFeed, MockWebhook};
use rss_notify::web::{create_router, AppState};

async fn create_test_server(feed: &MockFeed, webhook: &MockWebhook) -> TestServer {
    let app_state = Arc::new(AppState::new(common::cycle(feed, webhook)));
    TestServer::new(create_router(app_state)).expect("Failed to create test server")
}

async fn stats_total(server: &TestServer) -> u64 {
    let body: Value = server.get("/stats").await.json();
    body["data"]["total"].as_u64().unwrap()
}

// ============================================================================
// Check cycle
// ============================================================================

#[tokio::test]
async fn test_check_bootstraps_then_notifies_new_items() {
    let feed = MockFeed::start(rss_document(&[item("g2", "Second"), item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    // First check records everything silently
    let response = server.get("/check").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["bootstrapped"], 2);
    assert_eq!(body["data"]["notified"], 0);
    assert!(webhook.received().is_empty());

    // Two new items arrive
    feed.set_body(rss_document(&[
        item("g4", "Fourth"),
        item("g3", "Third"),
        item("g2", "Second"),
        item("g1", "First"),
    ]));
    let body: Value = server.post("/check").await.json();
    assert_eq!(body["data"]["notified"], 2);
    assert_eq!(webhook.titles(), vec!["Fourth", "Third"]);

    // Nothing new on the next check
    let body: Value = server.get("/check").await.json();
    assert_eq!(body["data"]["notified"], 0);
    assert_eq!(webhook.received().len(), 2);
    assert_eq!(stats_total(&server).await, 4);
}

#[tokio::test]
async fn test_check_rejected_delivery_is_not_retried() {
    let feed = MockFeed::start(rss_document(&[item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;
    server.get("/check").await.assert_status_ok();

    webhook.reply_with(json!({"code": 19001, "msg": "param invalid"}));
    feed.set_body(rss_document(&[item("g2", "Second"), item("g1", "First")]));

    let body: Value = server.get("/check").await.json();
    assert_eq!(body["data"]["failed"], 1);

    webhook.reply_with(json!({"StatusCode": 0, "StatusMessage": "success"}));
    let body: Value = server.get("/check").await.json();
    assert_eq!(body["data"]["notified"], 0);
    assert_eq!(webhook.received().len(), 1);
}

#[tokio::test]
async fn test_concurrent_checks_deliver_each_item_once() {
    let feed = MockFeed::start(rss_document(&[item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;
    server.get("/check").await.assert_status_ok();

    feed.set_body(rss_document(&[
        item("g3", "Third"),
        item("g2", "Second"),
        item("g1", "First"),
    ]));
    let (first, second) = tokio::join!(server.get("/check"), server.post("/check"));
    first.assert_status_ok();
    second.assert_status_ok();

    let mut titles = webhook.titles();
    titles.sort();
    assert_eq!(titles, vec!["Second", "Third"]);
    assert_eq!(stats_total(&server).await, 3);
}

#[tokio::test]
async fn test_check_feed_unavailable() {
    let feed = MockFeed::start(rss_document(&[item("g1", "First")])).await;
    feed.set_status(StatusCode::SERVICE_UNAVAILABLE);
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/check").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert_eq!(stats_total(&server).await, 0);
}

#[tokio::test]
async fn test_check_unparseable_feed() {
    let feed = MockFeed::start("this is not xml".to_string()).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/check").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

// ============================================================================
// Test delivery
// ============================================================================

#[tokio::test]
async fn test_send_test_delivers_newest_without_recording() {
    let feed = MockFeed::start(rss_document(&[item("g2", "Newest"), item("g1", "Older")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/test").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["delivered"], true);
    assert_eq!(body["data"]["entry"]["guid"], "g2");
    assert_eq!(body["data"]["entry"]["pubDate"], "Mon, 06 Jan 2025 10:00:00 GMT");

    assert_eq!(webhook.titles(), vec!["Newest"]);
    let card = &webhook.received()[0];
    assert_eq!(card["msg_type"], "interactive");
    assert_eq!(
        card["card"]["elements"][3]["actions"][0]["url"],
        "https://example.com/g2"
    );
    assert_eq!(stats_total(&server).await, 0);
}

#[tokio::test]
async fn test_send_test_empty_feed() {
    let feed = MockFeed::start(rss_document(&[])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/test").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_send_test_delivery_rejected() {
    let feed = MockFeed::start(rss_document(&[item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    webhook.reply_with(json!({"code": 9499, "msg": "bad request"}));
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/test").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "DELIVERY_FAILED");
}

// ============================================================================
// Init, clear and stats
// ============================================================================

#[tokio::test]
async fn test_init_marks_all_without_notifying() {
    let feed = MockFeed::start(rss_document(&[item("g2", "Second"), item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let body: Value = server.post("/init").await.json();
    assert_eq!(body["data"]["bootstrapped"], 2);

    // Unconditional even when the store already has records
    feed.set_body(rss_document(&[item("g3", "Third"), item("g2", "Second")]));
    let body: Value = server.post("/init").await.json();
    assert_eq!(body["data"]["bootstrapped"], 1);

    assert!(webhook.received().is_empty());
    assert_eq!(stats_total(&server).await, 3);
}

#[tokio::test]
async fn test_init_empty_feed() {
    let feed = MockFeed::start(rss_document(&[])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    server.get("/init").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_then_check_bootstraps_again() {
    let feed = MockFeed::start(rss_document(&[item("g1", "First")])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    server.get("/init").await.assert_status_ok();
    assert_eq!(stats_total(&server).await, 1);

    let body: Value = server.post("/clear").await.json();
    assert_eq!(body["data"]["cleared"], true);
    assert_eq!(stats_total(&server).await, 0);

    let body: Value = server.get("/check").await.json();
    assert_eq!(body["data"]["bootstrapped"], 1);
    assert!(webhook.received().is_empty());
}

#[tokio::test]
async fn test_stats_lists_recent_oldest_first() {
    let items: Vec<_> = [
        "g12", "g11", "g10", "g9", "g8", "g7", "g6", "g5", "g4", "g3", "g2", "g1",
    ]
    .into_iter()
    .map(|g| item(g, "Item"))
    .collect();
    let feed = MockFeed::start(rss_document(&items)).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    server.get("/init").await.assert_status_ok();

    let body: Value = server.get("/stats").await.json();
    assert_eq!(body["data"]["total"], 12);
    assert_eq!(body["data"]["latest"]["guid"], "g12");
    let guids: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["guid"].as_str().unwrap())
        .collect();
    assert_eq!(guids.len(), 10);
    assert_eq!(guids.first(), Some(&"g3"));
    assert_eq!(guids.last(), Some(&"g12"));
    assert!(body["data"]["items"][0]["pushedAt"].is_string());
}

#[tokio::test]
async fn test_stats_empty_store() {
    let feed = MockFeed::start(rss_document(&[])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let body: Value = server.get("/stats").await.json();
    assert_eq!(body["data"]["total"], 0);
    assert!(body["data"]["latest"].is_null());
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn test_root_and_health() {
    let feed = MockFeed::start(rss_document(&[])).await;
    let webhook = MockWebhook::start().await;
    let server = create_test_server(&feed, &webhook).await;

    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("/check"));

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
