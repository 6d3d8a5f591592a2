// src/notify/telegram.rs

//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::error::{AppError, Result};
use crate::models::TelegramConfig;
use crate::notify::Notifier;

/// Sends HTML messages (and photos) to every configured chat.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    /// Notifier for the subscriber chats.
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self::for_chats(client, config, config.chat_ids.clone())
    }

    /// Notifier for an explicit list of chats, e.g. the log channel.
    pub fn for_chats(client: Client, config: &TelegramConfig, chat_ids: Vec<String>) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            chat_ids,
        }
    }

    /// Carries the bot token; request errors are stripped of it.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        check_response(response).await
    }

    async fn send_photo(&self, chat_id: &str, caption: &str, image: &[u8]) -> Result<()> {
        let photo = Part::bytes(image.to_vec())
            .file_name("schedule.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", photo);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        check_response(response).await
    }
}

async fn check_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AppError::notify(format!("Telegram {status}: {text}")));
    }
    Ok(())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Tries every chat; fails if any chat failed.
    async fn send(&self, text: &str, image: Option<&[u8]>) -> Result<()> {
        if self.chat_ids.is_empty() {
            return Err(AppError::notify("no chat ids configured"));
        }

        let mut failures = Vec::new();
        for chat_id in &self.chat_ids {
            let result = match image {
                Some(bytes) => self.send_photo(chat_id, text, bytes).await,
                None => self.send_message(chat_id, text).await,
            };
            match result {
                Ok(()) => log::info!("Sent to chat {}", chat_id),
                Err(e) => {
                    log::warn!("Failed to send to chat {}: {}", chat_id, e);
                    failures.push(format!("{chat_id}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::notify(failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            api_base: "https://api.telegram.org/".into(),
            ..TelegramConfig::default()
        };
        let notifier = TelegramNotifier::new(Client::new(), &config);
        assert_eq!(
            notifier.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_send_error_does_not_leak_token() {
        let config = TelegramConfig {
            bot_token: "123456:SECRET-TOKEN".into(),
            api_base: "http://127.0.0.1:1".into(),
            chat_ids: vec!["42".into()],
            ..TelegramConfig::default()
        };
        let notifier = TelegramNotifier::new(Client::new(), &config);

        let text_err = notifier.send("hi", None).await.unwrap_err().to_string();
        assert!(text_err.contains("42"));
        assert!(!text_err.contains("SECRET-TOKEN"));

        let photo_err = notifier
            .send("hi", Some(b"png".as_slice()))
            .await
            .unwrap_err()
            .to_string();
        assert!(!photo_err.contains("SECRET-TOKEN"));
    }

    #[tokio::test]
    async fn test_send_without_chats_fails() {
        let notifier = TelegramNotifier::new(Client::new(), &TelegramConfig::default());
        assert!(notifier.send("hi", None).await.is_err());
    }
}
