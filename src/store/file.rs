//! JSON-file-backed store implementation
//!
//! Provides file-based slot persistence with atomic writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::Store;
use crate::error::{Error, Result};

/// Store persisting all slot records into one JSON file.
///
/// The full map is kept cached in memory; every write flushes it to disk
/// through a temp file plus rename, so a crashed write never leaves a
/// truncated file behind. Pagination chains survive process restarts when
/// reopened from the same path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the store file
    path: PathBuf,
    /// Current records (cached)
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl JsonFileStore {
    /// Open a store over `path`, loading existing records if the file
    /// is present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                Error::store(format!("Failed to read store file: {e}"))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                Error::store(format!("Failed to parse store file: {e}"))
            })?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the cached records to disk
    async fn flush(&self) -> Result<()> {
        let contents = {
            let entries = self.entries.read().await;
            serde_json::to_string_pretty(&*entries).map_err(|e| {
                Error::store(format!("Failed to serialize store: {e}"))
            })?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::store(format!("Failed to write store file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to rename store file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        self.flush().await
    }
}
