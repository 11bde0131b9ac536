//! RSS feed fetcher.
//!
//! Fetches the feed over HTTP with timeouts and a size limit, then extracts
//! a bounded, newest-first list of entries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::{RelayError, Result};
use crate::feed::types::{Entry, RawEntry};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("rss-notify/", env!("CARGO_PKG_VERSION"));

/// Source of feed entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch up to `limit` entries, newest first.
    ///
    /// An empty feed is a valid empty result, not an error.
    async fn fetch(&self, limit: usize) -> Result<Vec<Entry>>;
}

/// Fetches a single RSS feed over HTTP.
pub struct RssFetcher {
    client: Client,
    url: String,
    max_feed_size: u64,
}

impl RssFetcher {
    /// Create a fetcher for the configured feed.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// The feed URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RelayError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RelayError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(RelayError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(RelayError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FeedSource for RssFetcher {
    async fn fetch(&self, limit: usize) -> Result<Vec<Entry>> {
        debug!(url = %self.url, limit, "Fetching feed");
        let bytes = self.download().await?;
        parse_entries(&bytes, limit)
    }
}

/// Parse RSS bytes into at most `limit` entries, in feed order (newest first).
///
/// Items with neither a guid nor a link are skipped.
pub fn parse_entries(bytes: &[u8], limit: usize) -> Result<Vec<Entry>> {
    let channel = Channel::read_from(bytes)
        .map_err(|e| RelayError::Parse(format!("failed to parse feed: {}", e)))?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| {
            let raw = RawEntry {
                guid: item.guid().map(|g| g.value().to_string()),
                title: item.title().map(String::from),
                link: item.link().map(String::from),
                pub_date: item.pub_date().map(String::from),
                description: item.description().or(item.content()).map(String::from),
            };
            let entry = raw.normalize();
            if entry.is_none() {
                warn!(
                    title = item.title().unwrap_or_default(),
                    "Skipping feed item without guid or link"
                );
            }
            entry
        })
        .take(limit)
        .collect();

    Ok(entries)
}
