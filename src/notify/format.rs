// src/notify/format.rs

//! Notification text rendering.
//!
//! Two templates exist: "new schedule" for runs that brought new dates or
//! queues that appeared from empty, and "update" for runs that only changed
//! outage slots on known dates. Exactly one is rendered per run.

use crate::models::{
    ChangeKind, LinksConfig, Messages, QueueId, RecordSnapshot, ScheduleDiff, SpanChange,
    TimeRangeChange,
};
use crate::pipeline::group::{display_range, group_spans};
use crate::utils::display_date;

/// Which template a diff selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    NewSchedule,
    Update,
}

impl Template {
    pub fn for_diff(diff: &ScheduleDiff) -> Self {
        if diff.is_new_schedule() {
            Template::NewSchedule
        } else {
            Template::Update
        }
    }
}

/// Shared pieces of every message.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub messages: &'a Messages,
    pub links: &'a LinksConfig,
    /// Rendered "last updated" stamp
    pub stamp: Option<&'a str>,
}

/// Render the notification for a diff. Empty when the selected template has
/// nothing to show.
pub fn render_notification(
    diff: &ScheduleDiff,
    records: &RecordSnapshot,
    ctx: &MessageContext<'_>,
) -> String {
    match Template::for_diff(diff) {
        Template::NewSchedule => new_schedule_message(diff, records, ctx),
        Template::Update => update_message(diff, ctx),
    }
}

/// "New schedule" message: outage ranges per queue for every new date.
pub fn new_schedule_message(
    diff: &ScheduleDiff,
    records: &RecordSnapshot,
    ctx: &MessageContext<'_>,
) -> String {
    let queues = diff.queues_with_new_dates();
    if queues.is_empty() {
        return String::new();
    }

    let m = ctx.messages;
    let mut parts = vec![m.new_schedule_header.clone(), m.arrows.clone()];

    for date in &diff.all_new_dates {
        parts.push(m.date_line.replace("{date}", &display_date(date)));

        for queue in &queues {
            let ranges = outage_ranges(records, *queue, date);
            if ranges.is_empty() {
                continue;
            }
            let shown = ranges
                .iter()
                .map(display_range)
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(
                m.new_schedule_queue
                    .replace("{queue}", &queue.to_string())
                    .replace("{ranges}", &shown),
            );
            parts.push(String::new());
        }

        parts.push(String::new());
    }

    push_footer(&mut parts, ctx);
    parts.join("\n")
}

/// "Update" message: added and cancelled ranges per changed date.
pub fn update_message(diff: &ScheduleDiff, ctx: &MessageContext<'_>) -> String {
    let queues = diff.queues_with_changed_dates();
    if queues.is_empty() {
        return String::new();
    }

    let m = ctx.messages;
    let queue_list = queues
        .iter()
        .map(QueueId::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let mut parts = vec![
        m.update_header.replace("{queues}", &queue_list),
        m.arrows.clone(),
    ];

    for date in diff.changed_dates() {
        parts.push(m.date_line.replace("{date}", &display_date(date)));

        for queue in &queues {
            let Some(ranges) = diff
                .per_queue
                .get(queue)
                .and_then(|d| d.changed_dates.get(date))
            else {
                continue;
            };

            parts.push(m.update_queue.replace("{queue}", &queue.to_string()));
            for range in ranges {
                let template = match range.kind {
                    ChangeKind::Added => &m.range_added,
                    ChangeKind::Removed => &m.range_removed,
                };
                parts.push(template.replace("{range}", &display_range(range)));
            }
            parts.push(String::new());
        }

        parts.push(m.date_separator.clone());
    }

    push_footer(&mut parts, ctx);
    parts.join("\n")
}

/// Grouped outage ranges of one queue on one date.
fn outage_ranges(records: &RecordSnapshot, queue: QueueId, date: &str) -> Vec<TimeRangeChange> {
    let spans: Vec<SpanChange> = records
        .get(&queue)
        .into_iter()
        .flatten()
        .filter(|r| r.date == date && r.is_outage())
        .map(|r| SpanChange::new(r.span.clone(), ChangeKind::Added))
        .collect();
    group_spans(&spans)
}

fn push_footer(parts: &mut Vec<String>, ctx: &MessageContext<'_>) {
    parts.push(
        ctx.messages
            .footer
            .replace("{url}", &ctx.links.schedule_url)
            .replace("{subscribe}", &ctx.links.subscribe_url),
    );
    if let Some(stamp) = ctx.stamp {
        parts.push(stamp.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedRecord, QueueDiff};

    fn links() -> LinksConfig {
        LinksConfig {
            schedule_url: "https://example.com/schedule".into(),
            subscribe_url: "https://t.me/example".into(),
        }
    }

    fn record(queue: QueueId, date: &str, span: &str, color: &str) -> NormalizedRecord {
        NormalizedRecord {
            queue,
            date: date.into(),
            span: span.into(),
            color: color.into(),
        }
    }

    fn range(start: &str, end: &str, kind: ChangeKind) -> TimeRangeChange {
        TimeRangeChange {
            start: start.into(),
            end: end.into(),
            kind,
        }
    }

    #[test]
    fn test_new_schedule_message() {
        let q = QueueId::new(2, 1);
        let mut records = RecordSnapshot::new();
        records.insert(
            q,
            vec![
                record(q, "2025-01-10", "0000-0030", "red"),
                record(q, "2025-01-10", "0030-0100", "red"),
                record(q, "2025-01-10", "0100-0130", "green"),
                record(q, "2025-01-10", "0800-0830", "red"),
            ],
        );

        let mut diff = ScheduleDiff::default();
        diff.queues_with_changes.insert(q);
        diff.per_queue.insert(
            q,
            QueueDiff {
                new_dates: vec!["2025-01-10".into()],
                ..QueueDiff::default()
            },
        );
        diff.all_new_dates = vec!["2025-01-10".into()];
        diff.appeared_from_empty = vec![q];

        let messages = Messages::default();
        let links = links();
        let ctx = MessageContext {
            messages: &messages,
            links: &links,
            stamp: Some("🕐 14:35 10.01"),
        };

        let text = render_notification(&diff, &records, &ctx);
        let expected = [
            "🔔 Додано новий графік на завтра!",
            "⬇️⬇️⬇️\n",
            "🗓 10.01.2025\n",
            "Черга 2.1: \n🪫0:00-1:00, 8:00-8:30",
            "",
            "",
            "<a href=\"https://example.com/schedule\">🔗 Переглянути графік</a> | <a href=\"https://t.me/example\">⚡️ ПІДПИСАТИСЯ</a>",
            "🕐 14:35 10.01",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_update_message() {
        let q1 = QueueId::new(1, 2);
        let q2 = QueueId::new(10, 1);
        let mut diff = ScheduleDiff::default();
        for (q, ranges) in [
            (q2, vec![range("08:00", "09:00", ChangeKind::Removed)]),
            (q1, vec![range("00:00", "00:30", ChangeKind::Added)]),
        ] {
            diff.queues_with_changes.insert(q);
            let mut queue_diff = QueueDiff::default();
            queue_diff.changed_dates.insert("2025-01-10".into(), ranges);
            diff.per_queue.insert(q, queue_diff);
        }

        let messages = Messages::default();
        let links = links();
        let ctx = MessageContext {
            messages: &messages,
            links: &links,
            stamp: None,
        };

        assert_eq!(Template::for_diff(&diff), Template::Update);
        let text = render_notification(&diff, &RecordSnapshot::new(), &ctx);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Для черг 1.2, 10.1 🔔 ОНОВЛЕННЯ ГРАФІКА ВІДКЛЮЧЕНЬ!");
        assert!(text.contains("▶️ Черга 1.2:\n0:00-0:30 🪫 додали відключення\n"));
        assert!(text.contains("▶️ Черга 10.1:\n<s>8:00-9:00</s> 🔋 скасували відключення\n"));
        assert!(text.contains("======\n"));
        assert!(!text.contains("🕐"));
        assert!(text.find("Черга 1.2").unwrap() < text.find("Черга 10.1").unwrap());
    }

    #[test]
    fn test_empty_when_nothing_to_show() {
        let messages = Messages::default();
        let links = links();
        let ctx = MessageContext {
            messages: &messages,
            links: &links,
            stamp: None,
        };
        let diff = ScheduleDiff::default();
        assert!(update_message(&diff, &ctx).is_empty());
        assert!(new_schedule_message(&diff, &RecordSnapshot::new(), &ctx).is_empty());
    }
}
