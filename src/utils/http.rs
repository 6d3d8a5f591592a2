// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// First `max` characters of a response body, for error context.
pub fn body_excerpt(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_default_config() {
        assert!(create_async_client(&SourceConfig::default()).is_ok());
    }

    #[test]
    fn test_body_excerpt_counts_chars() {
        assert_eq!(body_excerpt("графік", 3), "гра");
        assert_eq!(body_excerpt("ok", 200), "ok");
    }
}
