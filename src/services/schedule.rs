// src/services/schedule.rs

//! HTTP schedule source.
//!
//! Queries the provider's JSON endpoint once per queue and scrapes the
//! public schedule page for its informational text.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Messages, PageContent, QueueFetch, QueueId, RawRecord, SourceConfig};
use crate::services::ScheduleSource;
use crate::utils::http::{body_excerpt, create_async_client};

/// Characters of a failed response body kept for the log.
const BODY_EXCERPT_LEN: usize = 200;

static UPDATE_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}:\d{2})\s+(\d{2}\.\d{2})\.\d{4}").expect("valid update stamp regex")
});

/// Schedule source backed by the provider's HTTP API.
pub struct HttpScheduleSource {
    config: SourceConfig,
    client: Client,
}

impl HttpScheduleSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        Ok(Self { config, client })
    }

    fn queue_url(&self, queue: QueueId) -> Result<url::Url> {
        let url = url::Url::parse_with_params(
            &self.config.api_base_url,
            &[
                ("cherga_id", queue.group.to_string()),
                ("pidcherga_id", queue.subgroup.to_string()),
            ],
        )?;
        Ok(url)
    }

    async fn fetch_info_text(&self) -> Result<String> {
        if self.config.page_url.trim().is_empty() {
            return Ok(String::new());
        }

        let html = self
            .client
            .get(&self.config.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let selector = Selector::parse(&self.config.info_selector)
            .map_err(|e| AppError::selector(&self.config.info_selector, format!("{e:?}")))?;
        let document = Html::parse_document(&html);

        let text = document
            .select(&selector)
            .next()
            .map(|el| {
                el.text()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        Ok(text)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ScheduleSource for HttpScheduleSource {
    async fn fetch_queue(&self, queue: QueueId) -> QueueFetch {
        let url = match self.queue_url(queue) {
            Ok(url) => url,
            Err(e) => return QueueFetch::failed(e.to_string()),
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Queue {}: request failed: {}", queue, e);
                return QueueFetch::failed(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Queue {}: failed to read body: {}", queue, e);
                return QueueFetch::failed(e.to_string());
            }
        };

        if !status.is_success() {
            let reason = format!(
                "HTTP {}. Body: {}",
                status,
                body_excerpt(&body, BODY_EXCERPT_LEN)
            );
            log::warn!("Queue {}: {}", queue, reason);
            return QueueFetch::failed(reason);
        }

        match parse_records(&body) {
            Ok(Some(records)) => QueueFetch::ok(records),
            Ok(None) => {
                log::warn!("Queue {}: response is not a list", queue);
                QueueFetch::ok(Vec::new())
            }
            Err(e) => {
                let reason = format!("{}. Body: {}", e, body_excerpt(&body, BODY_EXCERPT_LEN));
                log::warn!("Queue {}: {}", queue, reason);
                QueueFetch::failed(reason)
            }
        }
    }

    async fn fetch_page(&self) -> PageContent {
        let info_text = self.fetch_info_text().await.unwrap_or_else(|e| {
            log::warn!("Failed to fetch schedule page: {}", e);
            String::new()
        });

        let image = match self.config.screenshot_url.as_deref() {
            Some(url) if !url.trim().is_empty() => match self.fetch_image(url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("Failed to fetch schedule image: {}", e);
                    None
                }
            },
            _ => None,
        };

        PageContent { info_text, image }
    }
}

/// Parse a queue response body.
///
/// A bare object is treated as a one-element list. Returns `Ok(None)` when
/// the body is valid JSON but not a list.
pub fn parse_records(body: &str) -> Result<Option<Vec<RawRecord>>> {
    let text = body.trim();
    let value: serde_json::Value = if text.starts_with('{') {
        serde_json::from_str(&format!("[{text}]"))?
    } else {
        serde_json::from_str(text)?
    };

    match value {
        serde_json::Value::Array(_) => Ok(Some(serde_json::from_value(value)?)),
        _ => Ok(None),
    }
}

/// Render the "last updated" stamp found in the page text, if any.
///
/// `"Оновлено 14:35 10.01.2025"` becomes `"🕐 14:35 10.01"` with default messages.
pub fn update_stamp(info_text: &str, messages: &Messages) -> Option<String> {
    let caps = UPDATE_STAMP.captures(info_text)?;
    Some(
        messages
            .update_stamp
            .replace("{time}", &caps[1])
            .replace("{date}", &caps[2]),
    )
}
