// src/pipeline/monitor.rs

//! Schedule monitoring pipeline.
//!
//! One pass: fetch every queue, rotate and rebuild state, diff against the
//! previous run and announce real changes.

use std::collections::BTreeSet;

use crate::error::{AppError, Result};
use crate::models::{Config, QueueId};
use crate::notify::{LogNotifier, MessageContext, Notifier, Template, deliver, render_notification};
use crate::pipeline::diff::{Generation, QueueOutcome, calculate_diff};
use crate::pipeline::guard::FetchGuard;
use crate::pipeline::hash::build_hash_tree;
use crate::pipeline::normalize::normalize_all;
use crate::services::{ScheduleSource, fetch_all, update_stamp};
use crate::storage::StateStore;
use crate::utils::RunLog;

/// Options for a monitor run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log the message instead of sending it; state is still written
    pub dry_run: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No queue had usable data; nothing was written
    Aborted { failed: usize, total: usize },
    /// No reportable change
    Unchanged,
    /// A message was rendered and handed to the notifier
    Notified { delivered: bool },
    /// Changes were found but the selected template had nothing to show
    EmptyMessage,
}

/// Run the monitor once.
pub async fn run_monitor(
    config: &Config,
    source: &dyn ScheduleSource,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
    run_log: &mut RunLog,
    options: RunOptions,
) -> Result<RunOutcome> {
    store.initialize().await?;

    run_log.info(format!("Fetching schedules for {} queues", config.queues.len()));
    let fetched = fetch_all(source, &config.queues, config.source.max_concurrent).await;
    for (queue, fetch) in &fetched {
        match &fetch.failure {
            Some(reason) => run_log.warn(format!("{}: 0 records [API error: {}]", queue, reason)),
            None => run_log.info(format!("{}: {} records", queue, fetch.records.len())),
        }
    }

    match FetchGuard::new().validate(&fetched) {
        Ok(()) => {}
        Err(AppError::NoScheduleData { failed, total }) => {
            run_log.error(format!(
                "No usable schedule data ({} of {} queues failed), state left untouched",
                failed, total
            ));
            return Ok(RunOutcome::Aborted { failed, total });
        }
        Err(e) => return Err(e),
    }

    store.rotate().await?;

    let failed: BTreeSet<QueueId> = fetched
        .iter()
        .filter(|(_, f)| f.is_failed())
        .map(|(q, _)| *q)
        .collect();
    let records = normalize_all(&fetched);
    let hash_tree = build_hash_tree(&records, &failed);
    store.save_records(&records).await?;

    let previous = store.load().await?;
    if let Some(ts) = &previous.timestamp {
        run_log.info(format!("Comparing with state from {}", ts));
    }

    let result = calculate_diff(
        Generation::new(&hash_tree, &records),
        Generation::new(&previous.hash_tree, &previous.records),
    );
    for (queue, outcome) in &result.outcomes {
        match outcome {
            QueueOutcome::Initialized => run_log.info(format!("{}: first sighting, skipped", queue)),
            QueueOutcome::Appeared => run_log.info(format!("{}: schedule appeared", queue)),
            QueueOutcome::Changed => run_log.info(format!("{}: changed", queue)),
            QueueOutcome::Unattributed => {
                run_log.warn(format!("{}: hash changed, no slot change found", queue))
            }
            QueueOutcome::Empty | QueueOutcome::Unchanged => {}
        }
    }

    let timestamp = run_log.timestamp();

    if !result.has_changes() {
        run_log.info("No changes");
        store.save(&hash_tree, &timestamp).await?;
        return Ok(RunOutcome::Unchanged);
    }

    run_log.info(format!(
        "Changes: {} queues, {} from empty",
        result.change_count(),
        result.diff.appeared_from_empty.len()
    ));

    let page = source.fetch_page().await;
    let stamp = update_stamp(&page.info_text, &config.messages);
    let ctx = MessageContext {
        messages: &config.messages,
        links: &config.links,
        stamp: stamp.as_deref(),
    };

    match Template::for_diff(&result.diff) {
        Template::NewSchedule => run_log.info("Template: new schedule"),
        Template::Update => run_log.info("Template: schedule update"),
    }
    let message = render_notification(&result.diff, &records, &ctx);

    let outcome = if message.is_empty() {
        run_log.warn("Message is empty, nothing sent");
        RunOutcome::EmptyMessage
    } else {
        let target: &dyn Notifier = if options.dry_run {
            run_log.info("Dry run, message goes to the log only");
            &LogNotifier
        } else {
            run_log.info("Sending notification");
            notifier
        };
        let delivered = deliver(
            target,
            &message,
            page.image.as_deref(),
            &config.telegram,
            &config.messages,
            run_log,
        )
        .await;
        RunOutcome::Notified { delivered }
    };

    store.save(&hash_tree, &timestamp).await?;
    run_log.info("Done");
    Ok(outcome)
}
