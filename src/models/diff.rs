//! Structured change descriptors produced by the diff engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::QueueId;

/// Direction of a slot change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Slot turned into an outage
    Added,
    /// Slot stopped being an outage
    Removed,
}

/// A single changed span before grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanChange {
    pub span: String,
    pub kind: ChangeKind,
}

impl SpanChange {
    pub fn new(span: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            span: span.into(),
            kind,
        }
    }
}

/// A maximal contiguous run of same-kind span changes, times as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeChange {
    pub start: String,
    pub end: String,
    pub kind: ChangeKind,
}

/// Changes found for one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDiff {
    pub new_dates: Vec<String>,
    pub changed_dates: BTreeMap<String, Vec<TimeRangeChange>>,
}

impl QueueDiff {
    pub fn is_empty(&self) -> bool {
        self.new_dates.is_empty() && self.changed_dates.is_empty()
    }
}

/// Result of comparing two generations of schedule state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDiff {
    pub queues_with_changes: BTreeSet<QueueId>,
    pub per_queue: BTreeMap<QueueId, QueueDiff>,
    /// Sorted, deduplicated across queues
    pub all_new_dates: Vec<String>,
    pub appeared_from_empty: Vec<QueueId>,
}

impl ScheduleDiff {
    /// Whether the run produced anything worth announcing.
    pub fn has_changes(&self) -> bool {
        !self.queues_with_changes.is_empty() || !self.appeared_from_empty.is_empty()
    }

    /// Whether the "new schedule" template applies.
    pub fn is_new_schedule(&self) -> bool {
        !self.appeared_from_empty.is_empty() || !self.all_new_dates.is_empty()
    }

    /// Queues (numeric order) with at least one new date.
    pub fn queues_with_new_dates(&self) -> Vec<QueueId> {
        self.queues_with_changes
            .iter()
            .copied()
            .filter(|q| {
                self.per_queue
                    .get(q)
                    .is_some_and(|d| !d.new_dates.is_empty())
            })
            .collect()
    }

    /// Queues (numeric order) with at least one changed date.
    pub fn queues_with_changed_dates(&self) -> Vec<QueueId> {
        self.queues_with_changes
            .iter()
            .copied()
            .filter(|q| {
                self.per_queue
                    .get(q)
                    .is_some_and(|d| !d.changed_dates.is_empty())
            })
            .collect()
    }

    /// Union of changed dates across queues, sorted.
    pub fn changed_dates(&self) -> BTreeSet<&str> {
        self.per_queue
            .values()
            .flat_map(|d| d.changed_dates.keys().map(String::as_str))
            .collect()
    }
}
