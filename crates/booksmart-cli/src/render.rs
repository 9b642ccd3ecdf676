//! Output rendering for calendar views.

use booksmart_core::{CalendarEvent, EventKind, format_date};
use booksmart_engine::CalendarView;

use crate::error::{CliError, CliResult};

fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Meeting => "meeting",
        EventKind::Task => "task",
        EventKind::RecurringMeeting => "recurring",
    }
}

fn render_event(event: &CalendarEvent) -> String {
    let start = event.start.as_naive().format("%Y-%m-%d %H:%M");
    let end = match event.end {
        Some(end) if end.date() == event.start.date() => format!("-{}", end.time().format("%H:%M")),
        Some(end) => format!("-{}+", end.time().format("%H:%M")),
        None => String::new(),
    };
    format!(
        "{}{:<7}  {:<9}  {}",
        start,
        end,
        kind_label(event.kind),
        event.title
    )
}

/// Renders a calendar view as plain text, one event per line.
pub fn render_text(view: &CalendarView, user: &str) -> String {
    let through = format_date(view.horizon.last_day());
    if view.is_empty() {
        return format!("No events for {} through {}", user, through);
    }

    let mut out = format!(
        "Calendar for {} through {}: {} event{}\n",
        user,
        through,
        view.len(),
        if view.len() == 1 { "" } else { "s" }
    );
    for event in &view.events {
        out.push_str(&format!("\n{}", render_event(event).trim_end()));
    }
    out
}

/// Renders a calendar view as pretty-printed JSON.
pub fn render_json(view: &CalendarView) -> CliResult<String> {
    serde_json::to_string_pretty(view).map_err(|e| CliError::Output(e.to_string()))
}

/// Renders the warnings a degraded or lossy pass should surface.
pub fn render_warnings(view: &CalendarView) -> Vec<String> {
    let diagnostics = &view.diagnostics;
    let mut warnings: Vec<String> = diagnostics
        .failed_sources
        .iter()
        .map(|failure| {
            if failure.retryable {
                format!("could not load {}; try again later", failure)
            } else {
                format!("could not load {}", failure)
            }
        })
        .collect();

    for (source, count) in &diagnostics.malformed {
        warnings.push(format!("skipped {} malformed {} record(s)", count, source));
    }
    for id in &diagnostics.non_advancing_rules {
        warnings.push(format!("ignored recurrence #{}: it never advances", id));
    }
    for id in &diagnostics.truncated_rules {
        warnings.push(format!("recurrence #{} truncated at the occurrence cap", id));
    }
    warnings
}
