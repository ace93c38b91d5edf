//! Mapping from provider records to canonical events.

use crate::constants::UNTITLED_EVENT_SUMMARY;
use crate::event::{CalendarEvent, EventTime, RawEvent};

/// Normalize a provider record into a [`CalendarEvent`] tagged with `calendar_id`.
///
/// Returns `None` for records without an id. A missing summary becomes
/// "Untitled Event" and missing times become [`EventTime::Unscheduled`].
pub fn normalize(raw: RawEvent, calendar_id: &str) -> Option<CalendarEvent> {
    let id = raw.id.filter(|id| !id.is_empty())?;

    Some(CalendarEvent {
        id,
        calendar_id: calendar_id.to_string(),
        summary: summary_or_placeholder(raw.summary),
        description: raw.description,
        location: raw.location,
        start: raw.start.map(EventTime::from).unwrap_or_default(),
        end: raw.end.map(EventTime::from).unwrap_or_default(),
        attendees: raw.attendees,
        recurring_event_id: raw.recurring_event_id,
        color_id: raw.color_id,
        created: raw.created,
        updated: raw.updated,
        html_link: raw.html_link,
    })
}

/// Normalize a whole page, silently dropping records without an id.
pub fn normalize_all(raws: Vec<RawEvent>, calendar_id: &str) -> Vec<CalendarEvent> {
    raws.into_iter()
        .filter_map(|raw| normalize(raw, calendar_id))
        .collect()
}

/// Apply the server's echo of an update onto the event that was sent.
///
/// Identity (`id`, `calendar_id`) and fields the server does not echo for
/// updates (`created`, `html_link`) are kept from `local`; every mutable field
/// is taken from the response, including absences.
pub fn merge_update_echo(local: &CalendarEvent, echo: RawEvent) -> CalendarEvent {
    CalendarEvent {
        id: local.id.clone(),
        calendar_id: local.calendar_id.clone(),
        summary: summary_or_placeholder(echo.summary),
        description: echo.description,
        location: echo.location,
        start: echo.start.map(EventTime::from).unwrap_or_default(),
        end: echo.end.map(EventTime::from).unwrap_or_default(),
        attendees: echo.attendees,
        recurring_event_id: echo.recurring_event_id,
        color_id: echo.color_id,
        created: local.created,
        updated: echo.updated,
        html_link: local.html_link.clone(),
    }
}

fn summary_or_placeholder(summary: Option<String>) -> String {
    summary
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNTITLED_EVENT_SUMMARY.to_string())
}
