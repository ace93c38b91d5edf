//! Event types shared by the engine and the remote service boundary.
//!
//! `RawEvent` is what the provider sends, with every field optional.
//! `CalendarEvent` is the canonical shape the engine publishes; see
//! [`crate::normalize`] for the mapping between the two.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an event.
///
/// All-day events carry a date, timed events carry an instant, optionally
/// with the IANA zone the provider reported for it. Records that supply
/// neither are kept as `Unscheduled` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawEventTime", into = "RawEventTime")]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    /// Instant plus the provider's zone name, sent back unchanged on update
    /// since recurring events are expanded in that zone.
    DateTimeZoned {
        date_time: DateTime<FixedOffset>,
        time_zone: String,
    },
    #[default]
    Unscheduled,
}

impl EventTime {
    pub fn is_unscheduled(&self) -> bool {
        matches!(self, EventTime::Unscheduled)
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// The instant of a timed marker, zoned or not.
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            EventTime::DateTime(dt) | EventTime::DateTimeZoned { date_time: dt, .. } => Some(*dt),
            EventTime::Date(_) | EventTime::Unscheduled => None,
        }
    }

    /// Instant used to place the event on screen.
    ///
    /// Unscheduled times fall back to `now`. This value is for display only
    /// and must never be sent back to the remote service.
    pub fn display_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) | EventTime::DateTimeZoned { date_time: dt, .. } => {
                dt.with_timezone(&Utc)
            }
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            EventTime::Unscheduled => now,
        }
    }

    /// `None` for unscheduled times, so they are left out of outgoing payloads.
    pub fn scheduled(&self) -> Option<&EventTime> {
        (!self.is_unscheduled()).then_some(self)
    }
}

impl std::fmt::Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            EventTime::DateTimeZoned {
                date_time,
                time_zone,
            } => write!(f, "{} ({})", date_time.to_rfc3339(), time_zone),
            EventTime::Unscheduled => write!(f, "(unscheduled)"),
        }
    }
}

/// Wire shape of a time marker: at most one of `date` / `dateTime` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl From<RawEventTime> for EventTime {
    fn from(raw: RawEventTime) -> Self {
        if let Some(date_time) = raw.date_time {
            match raw.time_zone {
                Some(time_zone) => EventTime::DateTimeZoned {
                    date_time,
                    time_zone,
                },
                None => EventTime::DateTime(date_time),
            }
        } else if let Some(d) = raw.date {
            EventTime::Date(d)
        } else {
            EventTime::Unscheduled
        }
    }
}

impl From<EventTime> for RawEventTime {
    fn from(time: EventTime) -> Self {
        match time {
            EventTime::Date(d) => RawEventTime {
                date: Some(d),
                ..Default::default()
            },
            EventTime::DateTime(dt) => RawEventTime {
                date_time: Some(dt),
                ..Default::default()
            },
            EventTime::DateTimeZoned {
                date_time,
                time_zone,
            } => RawEventTime {
                date_time: Some(date_time),
                time_zone: Some(time_zone),
                ..Default::default()
            },
            EventTime::Unscheduled => RawEventTime::default(),
        }
    }
}

/// An event attendee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// "accepted", "declined", "tentative", "needsAction"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Event record as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<RawEventTime>,
    #[serde(default)]
    pub end: Option<RawEventTime>,
    #[serde(default)]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(default)]
    pub recurring_event_id: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Canonical event as published by the engine.
///
/// `id` is only unique within `calendar_id`; the pair identifies an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Option<Vec<Attendee>>,
    pub recurring_event_id: Option<String>,
    pub color_id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub html_link: Option<String>,
}

impl CalendarEvent {
    pub fn key(&self) -> (&str, &str) {
        (&self.calendar_id, &self.id)
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    pub fn fields(&self) -> EventFields {
        EventFields::from(self)
    }
}

/// The mutable subset of an event that is sent on create and update.
///
/// Identity and server-computed fields (id, timestamps, links, recurrence)
/// are never part of this payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl EventFields {
    pub fn new(summary: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        EventFields {
            summary: summary.into(),
            start: start.scheduled().cloned(),
            end: end.scheduled().cloned(),
            ..Default::default()
        }
    }
}

impl From<&CalendarEvent> for EventFields {
    fn from(event: &CalendarEvent) -> Self {
        EventFields {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: event.start.scheduled().cloned(),
            end: event.end.scheduled().cloned(),
            location: event.location.clone(),
            attendees: event.attendees.clone(),
            color_id: event.color_id.clone(),
        }
    }
}

impl From<CalendarEvent> for EventFields {
    fn from(event: CalendarEvent) -> Self {
        EventFields::from(&event)
    }
}
