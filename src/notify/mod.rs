//! Notification delivery.
//!
//! [`deliver`] applies the platform length limits before handing text to a
//! [`Notifier`]. Lengths are counted in characters, and truncation never
//! splits a grapheme cluster.

pub mod format;
mod telegram;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::models::{Messages, TelegramConfig, defaults::TRUNCATION_MARGIN};
use crate::utils::RunLog;

pub use format::{MessageContext, Template, render_notification};
pub use telegram::TelegramNotifier;

/// A delivery channel for notification text with an optional image.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str, image: Option<&[u8]>) -> Result<()>;
}

/// Writes notifications to the process log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str, image: Option<&[u8]>) -> Result<()> {
        match image {
            Some(bytes) => log::info!("[notify] image ({} bytes)\n{}", bytes.len(), text),
            None => log::info!("[notify]\n{}", text),
        }
        Ok(())
    }
}

/// Cut `text` to `limit - 100` characters and append `marker`.
///
/// Text within `limit` is returned unchanged.
pub fn truncate_message(text: &str, limit: usize, marker: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(TRUNCATION_MARGIN);
    let mut kept = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let len = grapheme.chars().count();
        if kept + len > keep {
            break;
        }
        kept += len;
        out.push_str(grapheme);
    }
    out.push_str(marker);
    out
}

/// Send a message under the caption and text limits. Returns whether the
/// message text was delivered.
///
/// With an image and text over the caption limit, the image goes out alone
/// with a short caption and the text follows as a separate message.
pub async fn deliver(
    notifier: &dyn Notifier,
    message: &str,
    image: Option<&[u8]>,
    limits: &TelegramConfig,
    messages: &Messages,
    run_log: &mut RunLog,
) -> bool {
    let len = message.chars().count();
    run_log.info(format!("Message length: {} chars", len));

    let result = match image {
        Some(bytes) if len > limits.caption_limit => {
            run_log.warn(format!(
                "Text {} > {}, sending photo and text separately",
                len, limits.caption_limit
            ));
            if let Err(e) = notifier.send(&messages.photo_caption, Some(bytes)).await {
                run_log.error(format!("Photo send failed: {}", e));
            }
            let text = truncate_message(message, limits.text_limit, &messages.truncated);
            notifier.send(&text, None).await
        }
        None if len > limits.text_limit => {
            run_log.warn(format!("Text {} > {}, truncating", len, limits.text_limit));
            let text = truncate_message(message, limits.text_limit, &messages.truncated);
            notifier.send(&text, None).await
        }
        _ => notifier.send(message, image).await,
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            run_log.error(format!("Send failed: {}", e));
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::error::AppError;

    /// Records every send; fails when `fail` is set.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, bool)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<(String, bool)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str, image: Option<&[u8]>) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((text.to_string(), image.is_some()));
            if self.fail {
                return Err(AppError::notify("chat unavailable"));
            }
            Ok(())
        }
    }

    fn run_log() -> RunLog {
        RunLog::new(chrono_tz::UTC)
    }

    #[test]
    fn test_truncate_within_limit_is_unchanged() {
        assert_eq!(truncate_message("коротко", 200, "…"), "коротко");
    }

    #[test]
    fn test_truncate_keeps_limit_minus_margin() {
        let text = "ж".repeat(300);
        let out = truncate_message(&text, 200, "[cut]");
        assert_eq!(out, format!("{}[cut]", "ж".repeat(100)));
    }

    #[test]
    fn test_truncate_does_not_split_graphemes() {
        // "e" + combining acute accent is one grapheme of two chars
        let text = "e\u{301}".repeat(150);
        let out = truncate_message(&text, 201, "");
        assert_eq!(out.chars().count(), 100);
        assert!(out.ends_with('\u{301}'));
    }

    #[tokio::test]
    async fn test_deliver_short_text_with_image() {
        let notifier = RecordingNotifier::default();
        let mut log = run_log();
        let ok = deliver(
            &notifier,
            "hello",
            Some(b"png".as_slice()),
            &TelegramConfig::default(),
            &Messages::default(),
            &mut log,
        )
        .await;

        assert!(ok);
        assert_eq!(notifier.sent(), vec![("hello".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_deliver_long_text_with_image_splits() {
        let notifier = RecordingNotifier::default();
        let mut log = run_log();
        let message = "x".repeat(2000);
        let ok = deliver(
            &notifier,
            &message,
            Some(b"png".as_slice()),
            &TelegramConfig::default(),
            &Messages::default(),
            &mut log,
        )
        .await;

        assert!(ok);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("📸".to_string(), true));
        assert_eq!(sent[1], (message, false));
    }

    #[tokio::test]
    async fn test_deliver_truncates_long_text() {
        let notifier = RecordingNotifier::default();
        let mut log = run_log();
        let messages = Messages::default();
        let ok = deliver(
            &notifier,
            &"x".repeat(5000),
            None,
            &TelegramConfig::default(),
            &messages,
            &mut log,
        )
        .await;

        assert!(ok);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.ends_with(&messages.truncated));
        assert_eq!(
            sent[0].0.chars().count(),
            3996 + messages.truncated.chars().count()
        );
    }

    #[tokio::test]
    async fn test_deliver_reports_failure() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let mut log = run_log();
        let ok = deliver(
            &notifier,
            "hello",
            None,
            &TelegramConfig::default(),
            &Messages::default(),
            &mut log,
        )
        .await;

        assert!(!ok);
        assert!(log.lines().iter().any(|l| l.contains("Send failed")));
    }
}
