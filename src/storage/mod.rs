//! Storage abstractions for monitor state.
//!
//! Exactly one prior generation is kept. Hashes and records live in
//! separate stores because records are rotated every run while the hash
//! state is overwritten only once the run has finished.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── last_hash.json   # timestamp + main/span hashes of the last finished run
//! ├── current.json     # normalized records of the latest run
//! └── previous.json    # normalized records of the run before it
//! ```

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{HashTree, QueueHash, QueueId, RecordSnapshot, SpanHashes};

// Re-export for convenience
pub use local::LocalStorage;

/// Persisted hash record (`last_hash.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashState {
    /// Run timestamp, `None` before the first save
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub main_hashes: BTreeMap<QueueId, QueueHash>,

    #[serde(default)]
    pub span_hashes: BTreeMap<QueueId, SpanHashes>,
}

impl HashState {
    pub fn new(tree: &HashTree, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            main_hashes: tree.main.clone(),
            span_hashes: tree.spans.clone(),
        }
    }

    pub fn into_tree(self) -> HashTree {
        HashTree {
            main: self.main_hashes,
            spans: self.span_hashes,
        }
    }
}

/// The previous generation as seen at the start of a diff.
#[derive(Debug, Clone, Default)]
pub struct PreviousState {
    pub hash_tree: HashTree,
    pub records: RecordSnapshot,
    pub timestamp: Option<String>,
}

/// Summary for the `info` command.
#[derive(Debug, Clone, Default)]
pub struct StoreInfo {
    pub timestamp: Option<String>,
    pub tracked_queues: usize,
    pub empty_queues: usize,
    pub current_records: usize,
    pub previous_records: usize,
}

/// Trait for state storage backends.
///
/// Not safe for concurrent writers; callers serialize runs.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Create empty hash state and previous snapshot if they do not exist.
    async fn initialize(&self) -> Result<()>;

    /// Last saved hash tree, previous records and timestamp.
    async fn load(&self) -> Result<PreviousState>;

    /// Move the current record snapshot into the previous slot.
    async fn rotate(&self) -> Result<()>;

    /// Write the record snapshot of this run.
    async fn save_records(&self, records: &RecordSnapshot) -> Result<()>;

    /// Write the hash tree of this run.
    async fn save(&self, tree: &HashTree, timestamp: &str) -> Result<()>;

    /// Summarize what is stored.
    async fn info(&self) -> Result<StoreInfo>;
}
