use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::{Session, keep_time_zone, parse_event_time};
use crate::render::Render;

/// Fields to overwrite; `None` keeps the current value.
pub struct Changes {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

pub async fn run(
    session: &Session,
    calendar_id: &str,
    event_id: &str,
    date: Option<&str>,
    changes: Changes,
) -> Result<()> {
    session.require_auth()?;
    let mut event = session.find_event(calendar_id, event_id, date).await?;

    if let Some(title) = changes.title {
        event.summary = title;
    }
    if let Some(start) = changes.start {
        event.start = keep_time_zone(&event.start, parse_event_time(&start)?);
    }
    if let Some(end) = changes.end {
        event.end = keep_time_zone(&event.end, parse_event_time(&end)?);
    }
    if let Some(description) = changes.description {
        event.description = Some(description);
    }
    if let Some(location) = changes.location {
        event.location = Some(location);
    }

    let Some(updated) = session.coordinator.update(&event).await else {
        let error = session.engine.snapshot().error.unwrap_or_default();
        anyhow::bail!(error);
    };

    println!("{} {}", "Updated".yellow(), updated.render());
    Ok(())
}
