//! Schedule record shapes, raw and normalized.

use serde::{Deserialize, Serialize};

use super::QueueId;

/// Color value that marks an outage interval.
pub const OUTAGE_COLOR: &str = "red";

/// A schedule entry as published by the source.
///
/// Missing fields default to empty strings; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub span: String,
    #[serde(default)]
    pub color: String,
}

impl RawRecord {
    pub fn new(date: impl Into<String>, span: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            span: span.into(),
            color: color.into(),
        }
    }
}

/// A record in canonical form, bound to its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredRecord", try_from = "StoredRecord")]
pub struct NormalizedRecord {
    pub queue: QueueId,
    pub date: String,
    pub span: String,
    /// Trimmed and lowercased
    pub color: String,
}

impl NormalizedRecord {
    /// Whether this slot is an outage.
    pub fn is_outage(&self) -> bool {
        self.color == OUTAGE_COLOR
    }
}

/// On-disk layout of a normalized record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    cherga: u32,
    pidcherga: u32,
    queue_key: String,
    date: String,
    span: String,
    color: String,
}

impl From<NormalizedRecord> for StoredRecord {
    fn from(record: NormalizedRecord) -> Self {
        Self {
            cherga: record.queue.group,
            pidcherga: record.queue.subgroup,
            queue_key: record.queue.to_string(),
            date: record.date,
            span: record.span,
            color: record.color,
        }
    }
}

impl TryFrom<StoredRecord> for NormalizedRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        if stored.cherga == 0 || stored.pidcherga == 0 {
            return Err(format!("invalid queue {}", stored.queue_key));
        }
        Ok(Self {
            queue: QueueId::new(stored.cherga, stored.pidcherga),
            date: stored.date,
            span: stored.span,
            color: stored.color,
        })
    }
}

/// Outcome of fetching one queue.
///
/// A failure is carried as a value so one bad queue never aborts the run.
#[derive(Debug, Clone, Default)]
pub struct QueueFetch {
    pub records: Vec<RawRecord>,
    pub failure: Option<String>,
}

impl QueueFetch {
    pub fn ok(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            failure: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Non-failed with at least one record.
    pub fn is_usable(&self) -> bool {
        !self.is_failed() && !self.records.is_empty()
    }
}

/// Informational content scraped from the schedule page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub info_text: String,
    pub image: Option<Vec<u8>>,
}
