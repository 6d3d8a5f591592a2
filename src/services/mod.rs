//! Service layer for talking to the schedule provider.
//!
//! - Per-queue schedule fetching (`ScheduleSource`, `HttpScheduleSource`)
//! - Schedule page content (info text and optional image)

mod schedule;

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::models::{PageContent, QueueFetch, QueueId, QueueSet};

pub use schedule::{HttpScheduleSource, parse_records, update_stamp};

/// Source of per-queue schedule records and page content.
///
/// Implementations never return errors: a failed queue is reported through
/// [`QueueFetch::failure`] and a failed page through empty [`PageContent`].
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_queue(&self, queue: QueueId) -> QueueFetch;

    async fn fetch_page(&self) -> PageContent;
}

/// Fetch every queue of the set with at most `max_concurrent` requests in flight.
pub async fn fetch_all<S>(
    source: &S,
    queues: &QueueSet,
    max_concurrent: usize,
) -> BTreeMap<QueueId, QueueFetch>
where
    S: ScheduleSource + ?Sized,
{
    stream::iter(queues.ids())
        .map(|queue| async move { (queue, source.fetch_queue(queue).await) })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    struct CountingSource;

    #[async_trait]
    impl ScheduleSource for CountingSource {
        async fn fetch_queue(&self, queue: QueueId) -> QueueFetch {
            if queue.group == 2 {
                return QueueFetch::failed("boom");
            }
            let records = (0..queue.subgroup)
                .map(|_| RawRecord::new("2025-01-10", "0000-0030", "red"))
                .collect();
            QueueFetch::ok(records)
        }

        async fn fetch_page(&self) -> PageContent {
            PageContent::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_all_covers_every_queue() {
        let results = fetch_all(&CountingSource, &QueueSet::new(3, 2), 2).await;

        assert_eq!(results.len(), 6);
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), QueueSet::new(3, 2).ids());
        assert_eq!(results[&QueueId::new(1, 2)].records.len(), 2);
        assert!(results[&QueueId::new(2, 1)].is_failed());
    }

    #[tokio::test]
    async fn test_fetch_all_zero_concurrency_still_runs() {
        let results = fetch_all(&CountingSource, &QueueSet::new(1, 1), 0).await;
        assert_eq!(results.len(), 1);
    }
}
