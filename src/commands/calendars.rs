use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::{Session, expect_completed};
use crate::render::Render;

pub async fn run(session: &Session) -> Result<()> {
    session.require_auth()?;
    let calendars = expect_completed(session.engine.sync_calendar_list().await)?;

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for cal in &calendars {
        println!("{}", cal.render());
    }

    Ok(())
}
