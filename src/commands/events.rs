use anyhow::Result;
use calsync_core::EventTime;
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::commands::Session;
use crate::render::{Render, event_date, format_date_label};

pub async fn run(
    session: &Session,
    view: Option<&str>,
    date: Option<&str>,
    incremental: bool,
    calendars: &[String],
) -> Result<()> {
    session.require_auth()?;
    let report = session
        .load_window(view, date, incremental, calendars)
        .await?;

    println!("{}", report.window.to_string().dimmed());
    for result in &report.calendars {
        println!("{}", result.render());
    }
    println!();

    let now = Utc::now();
    let mut events = session.engine.events();
    events.sort_by_key(|e| e.start.display_instant(now));

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let mut current_date = None;
    for event in &events {
        let date = event_date(&event.start);
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date).bold());
            current_date = Some(date);
        }
        println!("{}", event.render());
    }

    let unscheduled = events
        .iter()
        .filter(|e| matches!(e.start, EventTime::Unscheduled))
        .count();
    if unscheduled > 0 {
        println!();
        println!("{}", format!("{} events without a start time", unscheduled).yellow());
    }

    Ok(())
}
