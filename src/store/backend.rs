//! Storage backends for the seen-item sequence.
//!
//! Backends only know how to read and replace the whole sequence; ordering,
//! de-duplication and eviction live in [`super::SeenStore`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RelayError, Result};
use crate::store::types::SeenRecord;

/// Durable get-all / put-all storage for seen records.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Prepare the backing resource (create files, tables, ...).
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Read the full sequence, oldest first.
    async fn load(&self) -> Result<Vec<SeenRecord>>;

    /// Replace the full sequence.
    async fn save(&self, records: &[SeenRecord]) -> Result<()>;
}

/// On-disk layout of the JSON store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    items: Vec<SeenRecord>,
}

/// Pretty-printed JSON file: `{"items": [...]}`.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, file: &StoreFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;

        // Write next to the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn init(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if !tokio::fs::try_exists(&self.path).await? {
            self.write_file(&StoreFile::default()).await?;
            info!(path = %self.path.display(), "Initialized store file");
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<SeenRecord>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let file: StoreFile = serde_json::from_str(&data)
            .map_err(|e| RelayError::Store(format!("corrupt store file: {}", e)))?;
        Ok(file.items)
    }

    async fn save(&self, records: &[SeenRecord]) -> Result<()> {
        self.write_file(&StoreFile {
            items: records.to_vec(),
        })
        .await
    }
}

/// Process-local backend, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<SeenRecord>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Vec<SeenRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| RelayError::Store("memory store poisoned".to_string()))?;
        Ok(records.clone())
    }

    async fn save(&self, records: &[SeenRecord]) -> Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| RelayError::Store("memory store poisoned".to_string()))?;
        *stored = records.to_vec();
        Ok(())
    }
}
