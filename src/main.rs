mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Mirror remote calendars and edit their events from the terminal")]
struct Cli {
    /// Bearer credential handed to the provider
    #[arg(long, global = true, env = "CALSYNC_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List remote calendars
    Calendars,
    Events {
        /// day, 3days, workweek, week, 2weeks or month
        #[arg(long)]
        view: Option<String>,

        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Only fetch changes since the last sync
        #[arg(long)]
        incremental: bool,

        /// Only sync these calendars (by id, repeatable)
        #[arg(short, long)]
        calendar: Vec<String>,
    },
    Create {
        /// Calendar id
        calendar: String,

        title: String,

        /// Start (YYYY-MM-DD for all-day, or RFC 3339 e.g. "2025-03-20T15:00:00+01:00")
        #[arg(short, long)]
        start: String,

        /// End, same format as start (defaults to one hour or one day later)
        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },
    Update {
        calendar: String,
        event_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Date the event falls on, if it is outside the current week
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        calendar: String,
        event_id: String,

        /// Date the event falls on, if it is outside the current week
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the stored sync token for a calendar
    Token { calendar: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = commands::Session::open(cli.token)?;

    match cli.command {
        Commands::Calendars => commands::calendars::run(&session).await,
        Commands::Events {
            view,
            date,
            incremental,
            calendar,
        } => {
            commands::events::run(&session, view.as_deref(), date.as_deref(), incremental, &calendar)
                .await
        }
        Commands::Create {
            calendar,
            title,
            start,
            end,
            description,
            location,
        } => {
            let draft = commands::create::Draft {
                title,
                start,
                end,
                description,
                location,
            };
            commands::create::run(&session, &calendar, draft).await
        }
        Commands::Update {
            calendar,
            event_id,
            title,
            start,
            end,
            description,
            location,
            date,
        } => {
            let changes = commands::update::Changes {
                title,
                start,
                end,
                description,
                location,
            };
            commands::update::run(&session, &calendar, &event_id, date.as_deref(), changes).await
        }
        Commands::Delete {
            calendar,
            event_id,
            date,
        } => commands::delete::run(&session, &calendar, &event_id, date.as_deref()).await,
        Commands::Token { calendar } => commands::token::run(&session, &calendar),
    }
}
