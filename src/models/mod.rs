// src/models/mod.rs

//! Domain models for the outage monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod diff;
mod queue;
mod record;
mod state;

// Re-export all public types
pub use config::{
    Config, LinksConfig, LoggingConfig, Messages, SourceConfig, StorageConfig, TelegramConfig,
};
pub(crate) use config::defaults;
pub use diff::{ChangeKind, QueueDiff, ScheduleDiff, SpanChange, TimeRangeChange};
pub use queue::{QueueId, QueueSet};
pub use record::{NormalizedRecord, OUTAGE_COLOR, PageContent, QueueFetch, RawRecord};
pub use state::{HashTree, QueueHash, RecordSnapshot, SpanHashes, SpanMap};
