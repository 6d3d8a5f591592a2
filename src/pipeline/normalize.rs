//! Record normalization.
//!
//! Maps raw records onto the canonical per-queue shape. Nothing is
//! validated here; dates and spans pass through as opaque strings.

use std::collections::BTreeMap;

use crate::models::{NormalizedRecord, QueueFetch, QueueId, RawRecord, RecordSnapshot};

/// Normalize one queue's records.
///
/// A failed fetch and an empty fetch both produce an empty sequence.
pub fn normalize_queue(queue: QueueId, records: &[RawRecord], failed: bool) -> Vec<NormalizedRecord> {
    if failed || records.is_empty() {
        return Vec::new();
    }

    let mut normalized: Vec<NormalizedRecord> = records
        .iter()
        .map(|raw| NormalizedRecord {
            queue,
            date: raw.date.clone(),
            span: raw.span.clone(),
            color: raw.color.trim().to_lowercase(),
        })
        .collect();

    // Stable: duplicate (date, span) pairs keep their input order.
    normalized.sort_by(|a, b| (&a.date, &a.span).cmp(&(&b.date, &b.span)));
    normalized
}

/// Normalize every fetched queue.
pub fn normalize_all(fetched: &BTreeMap<QueueId, QueueFetch>) -> RecordSnapshot {
    fetched
        .iter()
        .map(|(queue, fetch)| {
            (
                *queue,
                normalize_queue(*queue, &fetch.records, fetch.is_failed()),
            )
        })
        .collect()
}
