use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Session;
use crate::render::Render;

pub async fn run(
    session: &Session,
    calendar_id: &str,
    event_id: &str,
    date: Option<&str>,
) -> Result<()> {
    session.require_auth()?;
    let event = session.find_event(calendar_id, event_id, date).await?;

    if !session.coordinator.delete(&event).await {
        let error = session.engine.snapshot().error.unwrap_or_default();
        anyhow::bail!(error);
    }

    println!("{} {}", "Deleted".red(), event.render());
    Ok(())
}
