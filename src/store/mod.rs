//! Seen-item store for rss-notify.
//!
//! A bounded, insertion-ordered record of processed entry guids. Every query
//! reads the full sequence from the backend; nothing is cached between calls.

pub mod backend;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub use backend::{JsonFileBackend, MemoryBackend, StoreBackend};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteKvBackend;
pub use types::{MarkOutcome, SeenRecord, StoreStats, DEFAULT_CAPACITY};

use crate::feed::Entry;
use crate::Result;

/// Bounded set of processed entries.
///
/// Read-modify-write operations are serialized within the process, so
/// concurrent `mark_seen` calls for the same guid append a single record.
/// Separate processes sharing one backend are last-writer-wins.
pub struct SeenStore {
    backend: Arc<dyn StoreBackend>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl SeenStore {
    /// Create a store holding up to [`DEFAULT_CAPACITY`] records.
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self::with_capacity(backend, DEFAULT_CAPACITY)
    }

    /// Create a store with a custom capacity.
    pub fn with_capacity(backend: Arc<dyn StoreBackend>, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Maximum number of records kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepare the backing resource.
    pub async fn init(&self) -> Result<()> {
        self.backend.init().await
    }

    /// All records, oldest first.
    ///
    /// A read failure is logged and treated as an empty store, so one I/O
    /// hiccup does not block polling (at the cost of possible re-notification).
    pub async fn records(&self) -> Vec<SeenRecord> {
        match self.backend.load().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to read seen-item store");
                Vec::new()
            }
        }
    }

    /// Whether an entry with this guid has been processed.
    pub async fn is_seen(&self, guid: &str) -> bool {
        self.records().await.iter().any(|r| r.guid == guid)
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records().await.is_empty()
    }

    /// Record an entry as processed.
    ///
    /// Idempotent: a guid already present is left untouched. Otherwise a record
    /// stamped with the current time is appended and the oldest records are
    /// evicted beyond capacity.
    ///
    /// Unlike [`records`](Self::records), a read failure here is returned as
    /// an error instead of being treated as empty, so a failed read never
    /// overwrites the stored sequence.
    pub async fn mark_seen(&self, entry: &Entry) -> Result<MarkOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.backend.load().await?;
        if records.iter().any(|r| r.guid == entry.guid) {
            debug!(guid = %entry.guid, "Entry already recorded, skipping save");
            return Ok(MarkOutcome::AlreadySeen);
        }

        records.push(SeenRecord {
            guid: entry.guid.clone(),
            title: entry.title.clone(),
            pub_date: entry.pub_date.clone(),
            pushed_at: Utc::now(),
        });

        if records.len() > self.capacity {
            let excess = records.len() - self.capacity;
            records.drain(..excess);
        }

        self.backend.save(&records).await?;
        debug!(guid = %entry.guid, total = records.len(), "Saved seen record");
        Ok(MarkOutcome::Inserted)
    }

    /// Total count and most recent record.
    pub async fn stats(&self) -> StoreStats {
        let records = self.records().await;
        StoreStats {
            total: records.len(),
            latest: records.last().cloned(),
        }
    }

    /// The `n` most recently inserted records, oldest first.
    pub async fn recent(&self, n: usize) -> Vec<SeenRecord> {
        let records = self.records().await;
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    /// Remove every record.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.save(&[]).await?;
        info!("Cleared all seen records");
        Ok(())
    }
}
