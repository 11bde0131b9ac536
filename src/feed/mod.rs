//! Feed source for rss-notify.
//!
//! Fetches the monitored RSS feed and normalizes its items into [`Entry`] values.

pub mod fetcher;
pub mod types;

pub use fetcher::{parse_entries, FeedSource, RssFetcher};
pub use types::{
    Entry, RawEntry, DEFAULT_TITLE, FULL_WINDOW, LATEST_WINDOW, MAX_DESCRIPTION_LENGTH,
};
