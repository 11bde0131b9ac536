//! Test helpers for integration tests.
//!
//! Provides local mock feed and webhook servers bound to port 0, plus
//! constructors wiring the real fetcher and notifier to them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rss_notify::config::{FeedConfig, WebhookConfig};
use rss_notify::{MemoryBackend, PollCycle, RssFetcher, SeenStore, WebhookNotifier};

/// An RSS item for [`rss_document`].
pub struct Item {
    pub guid: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn item(guid: &'static str, title: &'static str) -> Item {
    Item {
        guid,
        title,
        description: "",
    }
}

/// Render a minimal RSS 2.0 document, items in the given (newest-first) order.
pub fn rss_document(items: &[Item]) -> String {
    let body: String = items
        .iter()
        .map(|i| {
            format!(
                "<item><title>{}</title><link>https://example.com/{}</link>\
                 <guid>{}</guid><pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>\
                 <description><![CDATA[{}]]></description></item>",
                i.title, i.guid, i.guid, i.description
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Test</title>\
         <link>https://example.com</link><description>Test feed</description>{body}</channel></rss>"
    )
}

/// Mock feed endpoint serving a replaceable body at `/feed.xml`.
#[derive(Clone)]
pub struct MockFeed {
    pub addr: SocketAddr,
    state: Arc<Mutex<(StatusCode, String)>>,
}

impl MockFeed {
    pub async fn start(body: String) -> Self {
        let state = Arc::new(Mutex::new((StatusCode::OK, body)));
        let app = Router::new()
            .route("/feed.xml", get(serve_feed))
            .with_state(state.clone());
        let addr = spawn(app).await;
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/feed.xml", self.addr)
    }

    pub fn set_body(&self, body: String) {
        *self.state.lock().unwrap() = (StatusCode::OK, body);
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.lock().unwrap().0 = status;
    }
}

async fn serve_feed(State(state): State<Arc<Mutex<(StatusCode, String)>>>) -> impl IntoResponse {
    let (status, body) = state.lock().unwrap().clone();
    (status, [("content-type", "application/rss+xml")], body)
}

/// Mock chat webhook recording every posted card at `/hook`.
#[derive(Clone)]
pub struct MockWebhook {
    pub addr: SocketAddr,
    state: Arc<WebhookState>,
}

struct WebhookState {
    received: Mutex<Vec<Value>>,
    reply: Mutex<Value>,
}

impl MockWebhook {
    pub async fn start() -> Self {
        let state = Arc::new(WebhookState {
            received: Mutex::new(Vec::new()),
            reply: Mutex::new(json!({"code": 0, "msg": "success", "data": {}})),
        });
        let app = Router::new()
            .route("/hook", post(receive_card))
            .with_state(state.clone());
        let addr = spawn(app).await;
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    /// Replace the JSON body returned for subsequent posts.
    pub fn reply_with(&self, reply: Value) {
        *self.state.reply.lock().unwrap() = reply;
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }

    /// Titles of the received cards, in delivery order.
    pub fn titles(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|card| {
                card["card"]["elements"][0]["text"]["content"]
                    .as_str()
                    .map(|s| s.trim_matches('*').to_string())
            })
            .collect()
    }
}

async fn receive_card(
    State(state): State<Arc<WebhookState>>,
    Json(card): Json<Value>,
) -> Json<Value> {
    state.received.lock().unwrap().push(card);
    Json(state.reply.lock().unwrap().clone())
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn fetcher(url: String) -> RssFetcher {
    RssFetcher::new(&FeedConfig {
        url,
        ..Default::default()
    })
    .unwrap()
}

pub fn notifier(url: String) -> WebhookNotifier {
    WebhookNotifier::new(&WebhookConfig {
        url,
        ..Default::default()
    })
    .unwrap()
}

/// A poll cycle against the mock servers with an in-memory store and no delay.
pub fn cycle(feed: &MockFeed, webhook: &MockWebhook) -> Arc<PollCycle> {
    let store = Arc::new(SeenStore::new(Arc::new(MemoryBackend::new())));
    Arc::new(
        PollCycle::new(
            Arc::new(fetcher(feed.url())),
            store,
            Arc::new(notifier(webhook.url())),
        )
        .with_courtesy_delay(std::time::Duration::ZERO),
    )
}
