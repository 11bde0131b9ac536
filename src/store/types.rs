//! Seen-item store types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of records kept by default.
pub const DEFAULT_CAPACITY: usize = 100;

/// Persisted proof that an entry was processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenRecord {
    /// Entry guid.
    pub guid: String,
    /// Entry title at the time it was processed.
    #[serde(default)]
    pub title: String,
    /// Entry publish date at the time it was processed.
    #[serde(default)]
    pub pub_date: String,
    /// When the entry was processed.
    pub pushed_at: DateTime<Utc>,
}

/// Store summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of records held.
    pub total: usize,
    /// Most recently inserted record.
    pub latest: Option<SeenRecord>,
}

/// Result of marking an entry as seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A new record was appended.
    Inserted,
    /// The guid was already present; nothing changed.
    AlreadySeen,
}
