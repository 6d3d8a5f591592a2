//! Fetch guard.
//!
//! Stops a run before any state is touched when no queue produced usable
//! schedule data, so an outage of the source never gets recorded as
//! "every schedule vanished".

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::{QueueFetch, QueueId};

/// Result of the guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    /// At least one queue has data
    Usable {
        usable: usize,
        failed: usize,
        empty: usize,
    },
    /// Every queue failed or came back empty
    AllUnavailable { failed: usize, total: usize },
}

/// Guard over a complete set of queue fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard;

impl FetchGuard {
    pub fn new() -> Self {
        Self
    }

    /// Classify the fetched set.
    pub fn check(&self, fetched: &BTreeMap<QueueId, QueueFetch>) -> GuardResult {
        let failed = fetched.values().filter(|f| f.is_failed()).count();
        let usable = fetched.values().filter(|f| f.is_usable()).count();
        let empty = fetched.len() - failed - usable;

        if usable == 0 {
            return GuardResult::AllUnavailable {
                failed,
                total: fetched.len(),
            };
        }

        GuardResult::Usable {
            usable,
            failed,
            empty,
        }
    }

    /// Return Ok if the run may proceed, Err if nothing usable was fetched.
    pub fn validate(&self, fetched: &BTreeMap<QueueId, QueueFetch>) -> Result<()> {
        match self.check(fetched) {
            GuardResult::Usable {
                usable,
                failed,
                empty,
            } => {
                log::info!(
                    "Fetch guard: OK ({} usable, {} empty, {} failed)",
                    usable,
                    empty,
                    failed
                );
                Ok(())
            }
            GuardResult::AllUnavailable { failed, total } => {
                log::error!(
                    "Fetch guard: no usable schedule ({} of {} queues failed)",
                    failed,
                    total
                );
                Err(AppError::NoScheduleData { failed, total })
            }
        }
    }
}
