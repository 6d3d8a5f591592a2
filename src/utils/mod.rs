//! Utility functions and helpers.

pub mod http;
pub mod run_log;

pub use run_log::RunLog;

use chrono::NaiveDate;

/// Render an ISO `YYYY-MM-DD` date as `DD.MM.YYYY`; other input is returned as is.
pub fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2025-01-10"), "10.01.2025");
        assert_eq!(display_date("tomorrow"), "tomorrow");
    }
}
