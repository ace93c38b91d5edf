use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Session;

pub fn run(session: &Session, calendar_id: &str) -> Result<()> {
    match session.engine.sync_token(calendar_id) {
        Some(token) => println!("{}", token),
        None => println!("{}", format!("No sync token stored for {}", calendar_id).dimmed()),
    }
    Ok(())
}
