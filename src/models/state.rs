//! Hash tree and snapshot types shared by the pipeline and storage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NormalizedRecord, QueueId};

/// `span -> color hash`
pub type SpanMap = BTreeMap<String, String>;

/// `date -> span -> color hash`
pub type SpanHashes = BTreeMap<String, SpanMap>;

/// Normalized records of every queue from one run.
pub type RecordSnapshot = BTreeMap<QueueId, Vec<NormalizedRecord>>;

/// Aggregate hash of one queue.
///
/// `Empty` covers both "no records" and "fetch failed"; the two are not
/// distinguished downstream. Persisted as `""` or the hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum QueueHash {
    Empty,
    Digest(String),
}

impl QueueHash {
    pub fn is_empty(&self) -> bool {
        matches!(self, QueueHash::Empty)
    }
}

impl fmt::Display for QueueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueHash::Empty => f.write_str("<empty>"),
            QueueHash::Digest(hex) => f.write_str(hex),
        }
    }
}

impl From<String> for QueueHash {
    fn from(value: String) -> Self {
        if value.is_empty() {
            QueueHash::Empty
        } else {
            QueueHash::Digest(value)
        }
    }
}

impl From<QueueHash> for String {
    fn from(hash: QueueHash) -> Self {
        match hash {
            QueueHash::Empty => String::new(),
            QueueHash::Digest(hex) => hex,
        }
    }
}

/// Three-level hash structure for all queues of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashTree {
    /// Per-queue aggregate hash
    #[serde(default)]
    pub main: BTreeMap<QueueId, QueueHash>,

    /// Per-queue span hashes, only populated for non-empty queues
    #[serde(default)]
    pub spans: BTreeMap<QueueId, SpanHashes>,
}

impl HashTree {
    /// `None` when the queue has never been seen.
    pub fn main_hash(&self, queue: QueueId) -> Option<&QueueHash> {
        self.main.get(&queue)
    }

    pub fn span_hashes(&self, queue: QueueId) -> Option<&SpanHashes> {
        self.spans.get(&queue)
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }
}
