//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::QueueSet;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Schedule API and page settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Tracked queue set
    #[serde(default)]
    pub queues: QueueSet,

    /// State file location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Links placed in the message footer
    #[serde(default)]
    pub links: LinksConfig,

    /// Log level, timezone and run-log file
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Message templates
    #[serde(default)]
    pub messages: Messages,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override deployment secrets and URLs from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from a key lookup; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("API_BASE_URL") {
            self.source.api_base_url = v;
        }
        if let Some(v) = get("URL") {
            self.source.page_url = v.clone();
            self.links.schedule_url = v;
        }
        if let Some(v) = get("SUBSCRIBE") {
            self.links.subscribe_url = v;
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_IDS") {
            self.telegram.chat_ids = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("TELEGRAM_LOG_CHANNEL_ID") {
            self.telegram.log_chat_id = Some(v);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.api_base_url.trim().is_empty() {
            return Err(AppError::validation("source.api_base_url is empty"));
        }
        url::Url::parse(&self.source.api_base_url)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.max_concurrent == 0 {
            return Err(AppError::validation("source.max_concurrent must be > 0"));
        }
        scraper::Selector::parse(&self.source.info_selector)
            .map_err(|e| AppError::selector(&self.source.info_selector, format!("{e:?}")))?;
        if self.queues.groups == 0 || self.queues.subgroups == 0 {
            return Err(AppError::validation(
                "queues.groups and queues.subgroups must be > 0",
            ));
        }
        if self.telegram.caption_limit == 0 {
            return Err(AppError::validation("telegram.caption_limit must be > 0"));
        }
        if self.telegram.text_limit <= defaults::TRUNCATION_MARGIN {
            return Err(AppError::validation(format!(
                "telegram.text_limit must be > {}",
                defaults::TRUNCATION_MARGIN
            )));
        }
        if self.logging.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(AppError::validation(format!(
                "logging.timezone '{}' is not a known timezone",
                self.logging.timezone
            )));
        }
        Ok(())
    }

    /// Configured timezone, UTC if it does not parse.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.logging.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Schedule API and page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Per-queue JSON endpoint, queried with `cherga_id` / `pidcherga_id`
    #[serde(default)]
    pub api_base_url: String,

    /// Public schedule page
    #[serde(default)]
    pub page_url: String,

    /// CSS selector for the informational text block
    #[serde(default = "defaults::info_selector")]
    pub info_selector: String,

    /// Optional image to attach to notifications
    #[serde(default)]
    pub screenshot_url: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent queue requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            page_url: String::new(),
            info_selector: defaults::info_selector(),
            screenshot_url: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// State file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,

    /// Subscriber chats
    #[serde(default)]
    pub chat_ids: Vec<String>,

    /// Chat that receives the run log
    #[serde(default)]
    pub log_chat_id: Option<String>,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Photo caption limit
    #[serde(default = "defaults::caption_limit")]
    pub caption_limit: usize,

    /// Plain message limit
    #[serde(default = "defaults::text_limit")]
    pub text_limit: usize,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_ids: Vec::new(),
            log_chat_id: None,
            api_base: defaults::api_base(),
            caption_limit: defaults::caption_limit(),
            text_limit: defaults::text_limit(),
        }
    }
}

/// Links placed in the message footer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default)]
    pub schedule_url: String,
    #[serde(default)]
    pub subscribe_url: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// IANA timezone for run timestamps
    #[serde(default = "defaults::timezone")]
    pub timezone: String,

    /// File the run log is appended to
    #[serde(default = "defaults::log_file")]
    pub log_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            timezone: defaults::timezone(),
            log_file: defaults::log_file(),
        }
    }
}

/// Message template strings.
///
/// Placeholders: `{date}`, `{queue}`, `{queues}`, `{ranges}`, `{range}`,
/// `{url}`, `{subscribe}`, `{time}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub new_schedule_header: String,
    pub update_header: String,
    pub arrows: String,
    pub date_line: String,
    pub new_schedule_queue: String,
    pub update_queue: String,
    pub range_added: String,
    pub range_removed: String,
    pub date_separator: String,
    pub footer: String,
    pub update_stamp: String,
    pub truncated: String,
    pub photo_caption: String,
    pub report_title: String,
    pub report_started: String,
    pub report_finished: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            new_schedule_header: "🔔 Додано новий графік на завтра!".into(),
            update_header: "Для черг {queues} 🔔 ОНОВЛЕННЯ ГРАФІКА ВІДКЛЮЧЕНЬ!".into(),
            arrows: "⬇️⬇️⬇️\n".into(),
            date_line: "🗓 {date}\n".into(),
            new_schedule_queue: "Черга {queue}: \n🪫{ranges}".into(),
            update_queue: "▶️ Черга {queue}:".into(),
            range_added: "{range} 🪫 додали відключення".into(),
            range_removed: "<s>{range}</s> 🔋 скасували відключення".into(),
            date_separator: "======\n".into(),
            footer: "<a href=\"{url}\">🔗 Переглянути графік</a> | <a href=\"{subscribe}\">⚡️ ПІДПИСАТИСЯ</a>".into(),
            update_stamp: "🕐 {time} {date}".into(),
            truncated: "\n\n... (текст скорочено)".into(),
            photo_caption: "📸".into(),
            report_title: "📊 ЛОГ ВИКОНАННЯ СКРИПТА".into(),
            report_started: "🚀 СТАРТ [{time}]".into(),
            report_finished: "⏰ Завершено: {time}".into(),
        }
    }
}

pub(crate) mod defaults {
    /// Characters reserved for the truncation marker.
    pub const TRUNCATION_MARGIN: usize = 100;

    pub fn info_selector() -> String {
        "body".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; outage-monitor/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn storage_dir() -> String {
        "data".into()
    }
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn caption_limit() -> usize {
        1024
    }
    pub fn text_limit() -> usize {
        4096
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn timezone() -> String {
        "Europe/Kyiv".into()
    }
    pub fn log_file() -> String {
        "monitor.log".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.api_base_url = "https://example.com/api".into();
        config
    }

    #[test]
    fn validate_default_with_api_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_api() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = valid_config();
        config.source.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_timezone() {
        let mut config = valid_config();
        config.logging.timezone = "Mars/Olympus".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_queues_without_subgroups() {
        let config: Config = toml::from_str(
            r#"
            [source]
            api_base_url = "https://example.com/api"

            [queues]
            groups = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.queues.subgroups, 2);
        assert_eq!(config.queues.len(), 6);
        assert_eq!(config.source.api_base_url, "https://example.com/api");
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            api_base_url = "https://example.com/api"

            [queues]
            groups = 3
            subgroups = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.queues.len(), 3);
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.telegram.caption_limit, 1024);
        assert_eq!(config.messages.photo_caption, "📸");
    }

    #[test]
    fn overrides_apply_non_empty_values() {
        let mut config = valid_config();
        config.apply_overrides(|key| match key {
            "URL" => Some("https://example.com/page".into()),
            "TELEGRAM_CHAT_IDS" => Some("1, 2,,3".into()),
            "SUBSCRIBE" => Some("  ".into()),
            _ => None,
        });

        assert_eq!(config.links.schedule_url, "https://example.com/page");
        assert_eq!(config.source.page_url, "https://example.com/page");
        assert_eq!(config.telegram.chat_ids, vec!["1", "2", "3"]);
        assert!(config.links.subscribe_url.is_empty());
    }
}
