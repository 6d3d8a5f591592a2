// src/utils/run_log.rs

//! Per-run log collector.
//!
//! Every line is mirrored to the `log` facade as it is pushed and kept in
//! the collector until the caller drains it at the end of the run.

use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Messages;

/// Width of separator lines.
const RULE_WIDTH: usize = 60;

/// Collects the human-readable trail of one monitor run.
#[derive(Debug, Clone)]
pub struct RunLog {
    tz: Tz,
    started: DateTime<Utc>,
    lines: Vec<String>,
}

impl RunLog {
    /// Start a collector whose timestamps use `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            started: Utc::now(),
            lines: Vec::new(),
        }
    }

    /// Record an informational line.
    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!("{}", message);
        self.push(message);
    }

    /// Record a warning line.
    pub fn warn(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::warn!("{}", message);
        self.push(message);
    }

    /// Record an error line.
    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::error!("{}", message);
        self.push(message);
    }

    fn push(&mut self, message: &str) {
        let stamp = Utc::now().with_timezone(&self.tz).format("%H:%M:%S");
        self.lines.push(format!("{stamp} - {message}"));
    }

    /// Lines collected so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Take all collected lines, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    /// Current time in the run timezone as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// Render the collected lines as a report (HTML `<pre>` body).
    pub fn render(&self, messages: &Messages) -> String {
        self.render_limited(messages, usize::MAX)
    }

    /// Render the report in at most `limit` characters.
    ///
    /// Whole escaped lines are dropped from the end of the body and replaced
    /// by the truncation marker, so the `<pre>` block and footer stay intact.
    pub fn render_limited(&self, messages: &Messages, limit: usize) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let started = self
            .started
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let finished = Utc::now()
            .with_timezone(&self.tz)
            .format("%d.%m.%Y %H:%M:%S")
            .to_string();

        let head = format!(
            "{}\n\n{}\n{}\n\n<pre>",
            messages.report_title,
            rule,
            messages.report_started.replace("{time}", &started),
        );
        let tail = format!(
            "</pre>\n\n\n{}\n{} ({})",
            rule,
            messages.report_finished.replace("{time}", &finished),
            self.tz.name(),
        );

        let lines: Vec<String> = self.lines.iter().map(|l| escape_html(l)).collect();
        let full = lines.join("\n");
        let frame = head.chars().count() + tail.chars().count();

        if frame.saturating_add(full.chars().count()) <= limit {
            return format!("{head}{full}{tail}");
        }

        let budget = limit.saturating_sub(frame + messages.truncated.chars().count());
        let mut body = String::new();
        let mut used = 0;
        for line in &lines {
            let len = line.chars().count() + usize::from(!body.is_empty());
            if used + len > budget {
                break;
            }
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
            used += len;
        }
        body.push_str(&messages.truncated);

        format!("{head}{body}{tail}")
    }
}

/// Append a rendered report to a file, creating it if needed.
pub async fn append_to_file(path: impl AsRef<Path>, report: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(report.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
