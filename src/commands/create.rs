use anyhow::Result;
use calsync_core::{EventFields, EventTime};
use chrono::Duration;
use owo_colors::OwoColorize;

use crate::commands::{Session, parse_event_time};
use crate::render::Render;

pub struct Draft {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl Draft {
    fn into_fields(self) -> Result<EventFields> {
        let start = parse_event_time(&self.start)?;
        let end = match &self.end {
            Some(end) => parse_event_time(end)?,
            None => default_end(&start),
        };

        let mut fields = EventFields::new(self.title, start, end);
        fields.description = self.description;
        fields.location = self.location;
        Ok(fields)
    }
}

/// One day for all-day events, one hour otherwise.
fn default_end(start: &EventTime) -> EventTime {
    match start {
        EventTime::Date(d) => EventTime::Date(*d + Duration::days(1)),
        EventTime::DateTime(dt) => EventTime::DateTime(*dt + Duration::hours(1)),
        EventTime::DateTimeZoned {
            date_time,
            time_zone,
        } => EventTime::DateTimeZoned {
            date_time: *date_time + Duration::hours(1),
            time_zone: time_zone.clone(),
        },
        EventTime::Unscheduled => EventTime::Unscheduled,
    }
}

pub async fn run(session: &Session, calendar_id: &str, draft: Draft) -> Result<()> {
    session.require_auth()?;
    let fields = draft.into_fields()?;

    session.load_calendars(&[calendar_id.to_string()]).await?;

    let Some(event) = session.coordinator.create(calendar_id, fields).await else {
        let error = session.engine.snapshot().error.unwrap_or_default();
        anyhow::bail!(error);
    };

    println!("{} {}", "Created".green(), event.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_end_for_all_day_is_next_day() {
        let draft = Draft {
            title: "Offsite".into(),
            start: "2025-03-20".into(),
            end: None,
            description: None,
            location: None,
        };
        let fields = draft.into_fields().unwrap();
        assert_eq!(fields.end.unwrap().to_string(), "2025-03-21");
    }
}
