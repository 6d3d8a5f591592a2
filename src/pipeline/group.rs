//! Span grouping.
//!
//! Merges adjacent same-kind span changes into readable time ranges.

use crate::models::{SpanChange, TimeRangeChange};

/// Split a span into `(start, end)` as `HH:MM`.
///
/// Accepts `"HHMM-HHMM"` and `"HH:MM-HH:MM"`. A span without a `-`
/// yields `("", "")`.
pub fn parse_span(span: &str) -> (String, String) {
    let Some((start, end)) = span.split_once('-') else {
        return (String::new(), String::new());
    };

    if start.contains(':') {
        return (start.to_string(), end.to_string());
    }
    (with_colon(start), with_colon(end))
}

fn with_colon(compact: &str) -> String {
    let hours: String = compact.chars().take(2).collect();
    let minutes: String = compact.chars().skip(2).collect();
    format!("{hours}:{minutes}")
}

/// Group changes of one date into maximal contiguous same-kind ranges.
///
/// Two entries join only when the kind matches and the next start equals
/// the running end exactly.
pub fn group_spans(changes: &[SpanChange]) -> Vec<TimeRangeChange> {
    let mut sorted: Vec<&SpanChange> = changes.iter().collect();
    sorted.sort_by(|a, b| a.span.cmp(&b.span));

    let mut ranges = Vec::new();
    let mut current: Option<TimeRangeChange> = None;

    for change in sorted {
        let (start, end) = parse_span(&change.span);

        if let Some(run) = current.as_mut() {
            if run.kind == change.kind && run.end == start {
                run.end = end;
                continue;
            }
        }

        if let Some(done) = current.take() {
            ranges.push(done);
        }
        current = Some(TimeRangeChange {
            start,
            end,
            kind: change.kind,
        });
    }

    ranges.extend(current);
    ranges
}

/// Drop leading zeros from an `HH:MM` time for display: `08:00` -> `8:00`,
/// `00:30` -> `0:30`.
pub fn display_time(time: &str) -> String {
    let trimmed = time.trim_start_matches('0');
    let mut shown = if trimmed.is_empty() {
        "0:00".to_string()
    } else {
        trimmed.to_string()
    };
    if shown.starts_with(':') {
        shown.insert(0, '0');
    }
    shown
}

/// `start-end` with display times.
pub fn display_range(range: &TimeRangeChange) -> String {
    format!("{}-{}", display_time(&range.start), display_time(&range.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind::{Added, Removed};

    #[test]
    fn test_parse_span_forms() {
        assert_eq!(parse_span("0000-0030"), ("00:00".into(), "00:30".into()));
        assert_eq!(parse_span("08:00-08:30"), ("08:00".into(), "08:30".into()));
        assert_eq!(parse_span("garbage"), ("".into(), "".into()));
        assert_eq!(parse_span(""), ("".into(), "".into()));
    }

    #[test]
    fn test_parse_span_tolerates_extra_separator() {
        let (start, end) = parse_span("0000-0030-0100");
        assert_eq!(start, "00:00");
        assert_eq!(end, "00:30-0100");
    }

    #[test]
    fn test_group_contiguous_and_isolated() {
        let ranges = group_spans(&[
            SpanChange::new("0000-0030", Added),
            SpanChange::new("0030-0100", Added),
            SpanChange::new("0200-0230", Added),
        ]);

        assert_eq!(
            ranges,
            vec![
                TimeRangeChange { start: "00:00".into(), end: "01:00".into(), kind: Added },
                TimeRangeChange { start: "02:00".into(), end: "02:30".into(), kind: Added },
            ]
        );
        let shown: Vec<String> = ranges.iter().map(display_range).collect();
        assert_eq!(shown, vec!["0:00-1:00", "2:00-2:30"]);
    }

    #[test]
    fn test_group_splits_on_kind_change() {
        let ranges = group_spans(&[
            SpanChange::new("0030-0100", Removed),
            SpanChange::new("0000-0030", Added),
            SpanChange::new("0100-0130", Removed),
        ]);

        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start.as_str(), ranges[0].end.as_str()), ("00:00", "00:30"));
        assert_eq!(ranges[0].kind, Added);
        assert_eq!((ranges[1].start.as_str(), ranges[1].end.as_str()), ("00:30", "01:30"));
        assert_eq!(ranges[1].kind, Removed);
    }

    #[test]
    fn test_group_malformed_span_does_not_panic() {
        let ranges = group_spans(&[
            SpanChange::new("bad", Added),
            SpanChange::new("0000-0030", Added),
        ]);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].start, "");
    }

    #[test]
    fn test_group_empty() {
        assert!(group_spans(&[]).is_empty());
    }

    #[test]
    fn test_display_time() {
        assert_eq!(display_time("08:00"), "8:00");
        assert_eq!(display_time("00:30"), "0:30");
        assert_eq!(display_time("00:00"), "0:00");
        assert_eq!(display_time("10:00"), "10:00");
        assert_eq!(display_time(""), "0:00");
    }
}
