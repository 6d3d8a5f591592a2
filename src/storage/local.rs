//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── last_hash.json    # HashState
//! ├── current.json      # RecordSnapshot of the latest run
//! └── previous.json     # RecordSnapshot of the run before
//! ```
//!
//! Writes go to a temp file first and are renamed into place. Missing or
//! unreadable files load as empty state.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{HashTree, RecordSnapshot};
use crate::storage::{HashState, PreviousState, StateStore, StoreInfo};

const HASH_FILE: &str = "last_hash.json";
const CURRENT_FILE: &str = "current.json";
const PREVIOUS_FILE: &str = "previous.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data; a missing or corrupt file yields the default value.
    async fn read_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_bytes(key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable {}: {}", key, e);
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                T::default()
            }
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }
}

#[async_trait]
impl StateStore for LocalStorage {
    async fn initialize(&self) -> Result<()> {
        if !self.exists(HASH_FILE) {
            self.write_json(HASH_FILE, &HashState::default()).await?;
            log::info!("Created empty {}", HASH_FILE);
        }
        if !self.exists(PREVIOUS_FILE) {
            self.write_json(PREVIOUS_FILE, &RecordSnapshot::new()).await?;
            log::info!("Created empty {}", PREVIOUS_FILE);
        }
        Ok(())
    }

    async fn load(&self) -> Result<PreviousState> {
        let hashes: HashState = self.read_json_or_default(HASH_FILE).await;
        let records: RecordSnapshot = self.read_json_or_default(PREVIOUS_FILE).await;

        Ok(PreviousState {
            timestamp: hashes.timestamp.clone(),
            hash_tree: hashes.into_tree(),
            records,
        })
    }

    async fn rotate(&self) -> Result<()> {
        match self.read_bytes(CURRENT_FILE).await? {
            Some(bytes) => self.write_bytes(PREVIOUS_FILE, &bytes).await,
            None => {
                log::debug!("No {} to rotate", CURRENT_FILE);
                Ok(())
            }
        }
    }

    async fn save_records(&self, records: &RecordSnapshot) -> Result<()> {
        self.write_json(CURRENT_FILE, records).await
    }

    async fn save(&self, tree: &HashTree, timestamp: &str) -> Result<()> {
        self.write_json(HASH_FILE, &HashState::new(tree, timestamp))
            .await
    }

    async fn info(&self) -> Result<StoreInfo> {
        let hashes: HashState = self.read_json_or_default(HASH_FILE).await;
        let current: RecordSnapshot = self.read_json_or_default(CURRENT_FILE).await;
        let previous: RecordSnapshot = self.read_json_or_default(PREVIOUS_FILE).await;

        Ok(StoreInfo {
            timestamp: hashes.timestamp,
            tracked_queues: hashes.main_hashes.len(),
            empty_queues: hashes.main_hashes.values().filter(|h| h.is_empty()).count(),
            current_records: current.values().map(Vec::len).sum(),
            previous_records: previous.values().map(Vec::len).sum(),
        })
    }
}
