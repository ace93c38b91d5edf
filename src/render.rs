//! Colored terminal rendering for engine types.

use calsync_core::sync::{CalendarOutcome, CalendarSyncResult, FetchMode};
use calsync_core::{CalendarEvent, CalendarSource, EventTime};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarSource {
    fn render(&self) -> String {
        let mark = if self.selected {
            "●".green().to_string()
        } else {
            "○".dimmed().to_string()
        };
        format!("{} {} {}", mark, self.summary, format!("({})", self.id).dimmed())
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let tag = format!("[{}:{}]", self.calendar_id, self.id);
        let mut line = format!("  {} {} {}", format_time(&self.start), self.summary, tag.dimmed());
        if let Some(location) = &self.location {
            line.push_str(&format!(" @ {}", location));
        }
        line
    }
}

impl Render for CalendarSyncResult {
    fn render(&self) -> String {
        match &self.outcome {
            CalendarOutcome::Synced {
                events,
                mode,
                retried,
            } => {
                let mode = match (mode, retried) {
                    (_, true) => "token expired, full fetch",
                    (FetchMode::Incremental, false) => "incremental",
                    (FetchMode::Full, false) => "full",
                };
                format!(
                    "{} {} {}",
                    "✓".green(),
                    self.calendar_id,
                    format!("{} events, {}", events.len(), mode).dimmed()
                )
            }
            CalendarOutcome::Failed { error, .. } => {
                format!("{} {} {}", "✗".red(), self.calendar_id, error.to_string().red())
            }
        }
    }
}

/// Day an event is listed under; unscheduled events sort to today.
pub fn event_date(time: &EventTime) -> NaiveDate {
    match time {
        EventTime::Date(d) => *d,
        EventTime::DateTime(dt) | EventTime::DateTimeZoned { date_time: dt, .. } => {
            dt.with_timezone(&Local).date_naive()
        }
        EventTime::Unscheduled => Local::now().date_naive(),
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate) -> String {
    let today = Local::now().date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

fn format_time(time: &EventTime) -> String {
    match time {
        EventTime::Date(_) => "all-day".to_string(),
        EventTime::DateTime(dt) | EventTime::DateTimeZoned { date_time: dt, .. } => {
            format!("{:>7}", dt.with_timezone(&Local).format("%H:%M"))
        }
        EventTime::Unscheduled => format!("{:>7}", "--:--"),
    }
}
