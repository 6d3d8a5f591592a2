//! Outage monitor CLI
//!
//! Runs a single monitoring pass; schedule it with cron or a systemd timer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use outage_monitor::{
    error::Result,
    models::Config,
    notify::{LogNotifier, Notifier, TelegramNotifier},
    pipeline::{self, RunOptions, RunOutcome},
    services::HttpScheduleSource,
    storage::{LocalStorage, StateStore},
    utils::{RunLog, http, run_log},
};

/// Power outage schedule monitor
#[derive(Parser, Debug)]
#[command(
    name = "outage-monitor",
    version,
    about = "Watches an outage schedule and announces changes"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch schedules, diff against the last run and notify
    Run {
        /// Log the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration
    Validate,

    /// Show stored state info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Loaded configuration from {}", cli.config.display());

    let storage = LocalStorage::new(&config.storage.dir);

    match cli.command {
        Command::Run { dry_run } => run(&config, &storage, dry_run).await?,

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} queues)", config.queues.len());
            if !config.telegram.is_configured() {
                log::warn!("No Telegram bot token; notifications will only be logged");
            }
        }

        Command::Info => {
            let info = storage.info().await?;
            log::info!("Storage directory: {}", config.storage.dir);
            match info.timestamp {
                Some(ts) => log::info!("Last saved: {}", ts),
                None => log::info!("No state saved yet."),
            }
            log::info!(
                "Tracked queues: {} ({} empty)",
                info.tracked_queues,
                info.empty_queues
            );
            log::info!(
                "Records: {} current, {} previous",
                info.current_records,
                info.previous_records
            );
        }
    }

    Ok(())
}

/// One monitor pass plus the run report.
async fn run(config: &Config, storage: &LocalStorage, dry_run: bool) -> Result<()> {
    config.validate()?;

    let client = http::create_async_client(&config.source)?;
    let source = HttpScheduleSource::new(config.source.clone())?;
    let notifier: Box<dyn Notifier> = if config.telegram.is_configured() && !dry_run {
        Box::new(TelegramNotifier::new(client.clone(), &config.telegram))
    } else {
        if !dry_run {
            log::warn!("No Telegram bot token; notifications will only be logged");
        }
        Box::new(LogNotifier)
    };

    let mut run_log = RunLog::new(config.timezone());
    let result = pipeline::run_monitor(
        config,
        &source,
        storage,
        notifier.as_ref(),
        &mut run_log,
        RunOptions { dry_run },
    )
    .await;

    match &result {
        Ok(RunOutcome::Aborted { .. }) => run_log.error("Run aborted"),
        Ok(outcome) => log::debug!("Run outcome: {:?}", outcome),
        Err(e) => run_log.error(format!("Critical error: {}", e)),
    }

    flush_report(config, client, &run_log, dry_run).await;
    result.map(|_| ())
}

/// Append the run report to the log file and post it to the log chat.
async fn flush_report(config: &Config, client: reqwest::Client, run_log: &RunLog, dry_run: bool) {
    let report = run_log.render(&config.messages);

    if let Err(e) = run_log::append_to_file(&config.logging.log_file, &report).await {
        log::warn!("Failed to write {}: {}", config.logging.log_file, e);
    }

    let Some(chat_id) = config.telegram.log_chat_id.clone() else {
        return;
    };
    if dry_run || !config.telegram.is_configured() {
        return;
    }

    let text = run_log.render_limited(&config.messages, config.telegram.text_limit);
    let log_chat = TelegramNotifier::for_chats(client, &config.telegram, vec![chat_id]);
    if let Err(e) = log_chat.send(&text, None).await {
        log::warn!("Failed to send run log: {}", e);
    }
}
