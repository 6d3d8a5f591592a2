//! Diff calculation between two generations of schedule state.
//!
//! Classifies every queue of the current run and, where the aggregate hash
//! moved, walks the span hashes to find slots whose outage color flipped.
//!
//! Precedence per queue:
//!
//! 1. no previous hash at all: first sighting, skipped
//! 2. no current records: skipped
//! 3. previous hash empty, current not: schedule appeared, every date is new
//! 4. hash changed: new dates plus grouped slot changes on known dates
//! 5. hash unchanged: nothing

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::models::{
    ChangeKind, HashTree, NormalizedRecord, QueueDiff, QueueId, RecordSnapshot, ScheduleDiff,
    SpanChange, SpanHashes,
};

use super::group::group_spans;

/// Hash tree and records of one run.
#[derive(Debug, Clone, Copy)]
pub struct Generation<'a> {
    pub hashes: &'a HashTree,
    pub records: &'a RecordSnapshot,
}

impl<'a> Generation<'a> {
    pub fn new(hashes: &'a HashTree, records: &'a RecordSnapshot) -> Self {
        Self { hashes, records }
    }
}

/// How a single queue was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOutcome {
    /// Never seen before
    Initialized,
    /// No current records
    Empty,
    /// Went from empty to populated
    Appeared,
    /// Hash moved and at least one new date or slot change was found
    Changed,
    /// Hash moved but no change could be attributed to a slot
    Unattributed,
    /// Hash identical
    Unchanged,
}

/// Extended diff result with per-queue classification.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    pub diff: ScheduleDiff,
    pub outcomes: BTreeMap<QueueId, QueueOutcome>,
}

impl DiffResult {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        self.diff.has_changes()
    }

    /// Number of queues with reportable changes.
    pub fn change_count(&self) -> usize {
        self.diff.queues_with_changes.len()
    }
}

/// First record per `(date, span)` in a queue's record list.
fn slot_index(records: &[NormalizedRecord]) -> HashMap<(&str, &str), &NormalizedRecord> {
    let mut index = HashMap::new();
    for record in records {
        index
            .entry((record.date.as_str(), record.span.as_str()))
            .or_insert(record);
    }
    index
}

/// Compare the current generation against the previous one.
pub fn calculate_diff(current: Generation<'_>, previous: Generation<'_>) -> DiffResult {
    let empty_spans = SpanHashes::new();
    let no_records: Vec<NormalizedRecord> = Vec::new();

    let mut result = DiffResult::default();
    let mut all_new_dates = BTreeSet::new();

    for (&queue, current_hash) in &current.hashes.main {
        let current_records = current.records.get(&queue).unwrap_or(&no_records);

        let Some(previous_hash) = previous.hashes.main_hash(queue) else {
            result.outcomes.insert(queue, QueueOutcome::Initialized);
            continue;
        };

        if current_records.is_empty() {
            result.outcomes.insert(queue, QueueOutcome::Empty);
            continue;
        }

        let current_spans = current.hashes.span_hashes(queue).unwrap_or(&empty_spans);

        if previous_hash.is_empty() && !current_hash.is_empty() {
            let new_dates: Vec<String> = current_spans.keys().cloned().collect();
            all_new_dates.extend(new_dates.iter().cloned());

            result.diff.appeared_from_empty.push(queue);
            result.diff.queues_with_changes.insert(queue);
            result.diff.per_queue.insert(
                queue,
                QueueDiff {
                    new_dates,
                    changed_dates: BTreeMap::new(),
                },
            );
            result.outcomes.insert(queue, QueueOutcome::Appeared);
            continue;
        }

        if previous_hash == current_hash {
            result.outcomes.insert(queue, QueueOutcome::Unchanged);
            continue;
        }

        let previous_spans = previous.hashes.span_hashes(queue).unwrap_or(&empty_spans);
        let previous_records = previous.records.get(&queue).unwrap_or(&no_records);

        let queue_diff = diff_queue(
            current_spans,
            previous_spans,
            current_records,
            previous_records,
        );

        if queue_diff.is_empty() {
            result.outcomes.insert(queue, QueueOutcome::Unattributed);
            continue;
        }

        all_new_dates.extend(queue_diff.new_dates.iter().cloned());
        result.diff.queues_with_changes.insert(queue);
        result.diff.per_queue.insert(queue, queue_diff);
        result.outcomes.insert(queue, QueueOutcome::Changed);
    }

    result.diff.all_new_dates = all_new_dates.into_iter().collect();
    result
}

/// Fine-grained comparison of one queue whose aggregate hash moved.
fn diff_queue(
    current_spans: &SpanHashes,
    previous_spans: &SpanHashes,
    current_records: &[NormalizedRecord],
    previous_records: &[NormalizedRecord],
) -> QueueDiff {
    let new_dates: Vec<String> = current_spans
        .keys()
        .filter(|date| !previous_spans.contains_key(*date))
        .cloned()
        .collect();

    let current_index = slot_index(current_records);
    let previous_index = slot_index(previous_records);
    let mut changed_dates = BTreeMap::new();

    for (date, spans) in current_spans {
        let Some(old_spans) = previous_spans.get(date) else {
            continue;
        };

        let mut changes = Vec::new();
        for (span, hash) in spans {
            if old_spans.get(span) == Some(hash) {
                continue;
            }

            let key = (date.as_str(), span.as_str());
            // A slot without a matching record on either side is dropped.
            let (Some(new_rec), Some(old_rec)) = (current_index.get(&key), previous_index.get(&key))
            else {
                continue;
            };

            if new_rec.color != old_rec.color {
                let kind = if new_rec.is_outage() {
                    ChangeKind::Added
                } else {
                    ChangeKind::Removed
                };
                changes.push(SpanChange::new(span.clone(), kind));
            }
        }

        if !changes.is_empty() {
            changed_dates.insert(date.clone(), group_spans(&changes));
        }
    }

    QueueDiff {
        new_dates,
        changed_dates,
    }
}
