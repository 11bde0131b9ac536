//! SQLite key-value backend.
//!
//! Stores the whole seen sequence as one JSON value under a single key,
//! mirroring a hosted key-value namespace. Each `save` is one atomic upsert.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::backend::StoreBackend;
use crate::store::types::SeenRecord;

/// Key the seen sequence is stored under.
pub const ITEMS_KEY: &str = "items";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

/// Seen-record storage in a SQLite `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteKvBackend {
    pool: SqlitePool,
    key: String,
}

impl SqliteKvBackend {
    /// Open (creating if needed) a database file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening key-value store at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory key-value store");
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self {
            pool,
            key: ITEMS_KEY.to_string(),
        })
    }

    /// Remove the stored value entirely.
    pub async fn delete(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = $1")
            .bind(&self.key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for SqliteKvBackend {
    async fn load(&self) -> Result<Vec<SeenRecord>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = $1")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: &[SeenRecord]) -> Result<()> {
        if records.is_empty() {
            return self.delete().await;
        }

        let json = serde_json::to_string(records)?;
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&self.key)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
