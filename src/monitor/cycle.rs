//! Poll cycle: fetch entries, diff against the seen store, notify.
//!
//! Two policies are supported:
//!
//! - [`Policy::FullWindow`] re-checks the newest [`FULL_WINDOW`] entries every
//!   cycle, oldest first, and marks an entry seen only after it was delivered.
//!   A failed delivery is retried on the next cycle.
//! - [`Policy::StopAtKnown`] scans newest first and stops at the first entry
//!   already seen. New entries are marked seen *before* delivery and pass the
//!   keyword filter before being sent, so a failed delivery is never retried.
//!   An empty store is bootstrapped by marking every fetched entry without
//!   notifying. When a concurrent cycle has already claimed an entry, the
//!   scan stops there and that cycle delivers it.
//!
//! `StopAtKnown` assumes the feed never reorders or re-inserts old items: an
//! unseen entry below a re-inserted seen one is never looked at.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::feed::{Entry, FeedSource, FULL_WINDOW, LATEST_WINDOW};
use crate::monitor::filter::KeywordFilter;
use crate::notifier::Notifier;
use crate::store::{MarkOutcome, SeenStore};
use crate::Result;

/// Default pause between successive notifications.
pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_secs(1);

/// New-item detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Always scan the full window; mark seen after successful delivery.
    FullWindow,
    /// Stop at the first known entry; mark seen before filtered delivery.
    StopAtKnown,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Entries returned by the feed.
    pub fetched: usize,
    /// Entries delivered successfully.
    pub notified: usize,
    /// Entries whose delivery failed.
    pub failed: usize,
    /// Entries marked seen but withheld by the keyword filter.
    pub filtered: usize,
    /// Entries marked seen without notification during bootstrap.
    pub bootstrapped: usize,
}

impl CycleReport {
    /// Whether the cycle processed no new entry.
    pub fn is_idle(&self) -> bool {
        self.notified == 0 && self.failed == 0 && self.filtered == 0 && self.bootstrapped == 0
    }

    fn log_summary(&self) {
        if self.is_idle() {
            info!(fetched = self.fetched, "No new items");
        } else {
            info!(
                fetched = self.fetched,
                notified = self.notified,
                failed = self.failed,
                filtered = self.filtered,
                bootstrapped = self.bootstrapped,
                "Check complete"
            );
        }
    }
}

/// Result of a one-off delivery of the newest entry.
#[derive(Debug, Clone, Serialize)]
pub struct LatestDelivery {
    /// The newest feed entry.
    pub entry: Entry,
    /// Whether the notification was accepted.
    pub delivered: bool,
}

/// Orchestrates one check of the feed.
pub struct PollCycle {
    feed: Arc<dyn FeedSource>,
    store: Arc<SeenStore>,
    notifier: Arc<dyn Notifier>,
    filter: KeywordFilter,
    courtesy_delay: Duration,
}

impl PollCycle {
    /// Create a cycle with no keyword filter and the default courtesy delay.
    pub fn new(
        feed: Arc<dyn FeedSource>,
        store: Arc<SeenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            feed,
            store,
            notifier,
            filter: KeywordFilter::default(),
            courtesy_delay: DEFAULT_COURTESY_DELAY,
        }
    }

    /// Set the keyword filter used by [`Policy::StopAtKnown`].
    pub fn with_filter(mut self, filter: KeywordFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the pause between notifications.
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// The seen-item store.
    pub fn store(&self) -> &Arc<SeenStore> {
        &self.store
    }

    /// Run one cycle under the given policy.
    pub async fn run(&self, policy: Policy) -> Result<CycleReport> {
        match policy {
            Policy::FullWindow => self.run_full_window().await,
            Policy::StopAtKnown => self.run_stop_at_known().await,
        }
    }

    /// Run one cycle and log (rather than return) a fetch or parse failure.
    pub async fn run_logged(&self, policy: Policy) -> Option<CycleReport> {
        match self.run(policy).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, ?policy, "Check failed");
                None
            }
        }
    }

    /// Full-window recheck.
    pub async fn run_full_window(&self) -> Result<CycleReport> {
        let mut entries = self.feed.fetch(FULL_WINDOW).await?;
        let mut report = CycleReport {
            fetched: entries.len(),
            ..Default::default()
        };
        if entries.is_empty() {
            warn!("Feed returned no entries");
            return Ok(report);
        }

        // Oldest first, so notifications arrive in publication order
        entries.reverse();

        for entry in &entries {
            if self.store.is_seen(&entry.guid).await {
                continue;
            }

            info!(guid = %entry.guid, title = %entry.title, "New item found");
            if !self.notifier.notify(entry).await {
                // Left unseen so the next cycle retries it
                report.failed += 1;
                continue;
            }

            if let Err(e) = self.store.mark_seen(entry).await {
                error!(guid = %entry.guid, error = %e, "Failed to record delivered item");
            }
            report.notified += 1;
            self.pause().await;
        }

        report.log_summary();
        Ok(report)
    }

    /// Stop-at-first-known scan with mark-before-send and keyword filtering.
    pub async fn run_stop_at_known(&self) -> Result<CycleReport> {
        let entries = self.feed.fetch(self.store.capacity()).await?;
        let mut report = CycleReport {
            fetched: entries.len(),
            ..Default::default()
        };
        if entries.is_empty() {
            warn!("Feed returned no entries");
            return Ok(report);
        }

        if self.store.is_empty().await {
            info!("First run detected, recording current items without notifying");
            report.bootstrapped = self.mark_all(&entries).await;
            report.log_summary();
            return Ok(report);
        }

        for entry in &entries {
            if self.store.is_seen(&entry.guid).await {
                debug!(guid = %entry.guid, "Reached known item, stopping scan");
                break;
            }

            match self.store.mark_seen(entry).await {
                Ok(MarkOutcome::Inserted) => {}
                Ok(MarkOutcome::AlreadySeen) => {
                    // A concurrent cycle claimed this entry and owns the rest of the scan
                    debug!(guid = %entry.guid, "Item claimed by another check, stopping scan");
                    break;
                }
                Err(e) => {
                    error!(guid = %entry.guid, error = %e, "Failed to record item before delivery");
                }
            }

            if !self.filter.matches(entry) {
                info!(title = %entry.title, "Skipped (no keyword match)");
                report.filtered += 1;
                continue;
            }

            info!(guid = %entry.guid, title = %entry.title, "New item matched");
            if self.notifier.notify(entry).await {
                report.notified += 1;
            } else {
                report.failed += 1;
            }
            self.pause().await;
        }

        report.log_summary();
        Ok(report)
    }

    /// Record every current entry as seen without notifying, whatever the
    /// store already holds.
    pub async fn bootstrap(&self) -> Result<CycleReport> {
        let entries = self.feed.fetch(self.store.capacity()).await?;
        let report = CycleReport {
            fetched: entries.len(),
            bootstrapped: self.mark_all(&entries).await,
            ..Default::default()
        };
        info!(
            fetched = report.fetched,
            recorded = report.bootstrapped,
            "Initialized with existing items (no notifications sent)"
        );
        Ok(report)
    }

    /// Deliver the newest entry once, leaving the store untouched.
    ///
    /// Returns `None` when the feed is empty.
    pub async fn send_latest(&self) -> Result<Option<LatestDelivery>> {
        let entry = match self.feed.fetch(LATEST_WINDOW).await?.into_iter().next() {
            Some(entry) => entry,
            None => {
                warn!("Feed returned no entries");
                return Ok(None);
            }
        };

        info!(title = %entry.title, link = %entry.link, pub_date = %entry.pub_date, "Sending newest item");
        let delivered = self.notifier.notify(&entry).await;
        Ok(Some(LatestDelivery { entry, delivered }))
    }

    /// Mark entries oldest first; returns how many were newly recorded.
    async fn mark_all(&self, entries: &[Entry]) -> usize {
        let mut inserted = 0;
        for entry in entries.iter().rev() {
            match self.store.mark_seen(entry).await {
                Ok(MarkOutcome::Inserted) => inserted += 1,
                Ok(MarkOutcome::AlreadySeen) => {}
                Err(e) => error!(guid = %entry.guid, error = %e, "Failed to record item"),
            }
        }
        inserted
    }

    async fn pause(&self) {
        if !self.courtesy_delay.is_zero() {
            tokio::time::sleep(self.courtesy_delay).await;
        }
    }
}
