//! rss-notify - RSS to chat webhook relay
//!
//! Polls a single RSS feed, detects entries not seen before and forwards each
//! one as an interactive card to a chat webhook. Runs either as a long-lived
//! scheduled process or behind HTTP triggers with a persistent seen-item store.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod monitor;
pub mod notifier;
pub mod store;
pub mod web;

pub use config::{Config, RunMode, StoreKind};
pub use error::{RelayError, Result};
pub use feed::{Entry, FeedSource, RssFetcher};
pub use monitor::{CycleReport, KeywordFilter, LatestDelivery, Policy, PollCycle, Scheduler};
pub use notifier::{Notifier, WebhookNotifier};
pub use store::{JsonFileBackend, MemoryBackend, SeenRecord, SeenStore, StoreBackend, StoreStats};
#[cfg(feature = "sqlite")]
pub use store::SqliteKvBackend;
