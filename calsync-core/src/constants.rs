/// Days added on each side of a view window.
pub const DEFAULT_WINDOW_PADDING_DAYS: i64 = 7;
pub const MAX_WINDOW_PADDING_DAYS: i64 = 366;

/// Google's alias for the user's main calendar. Selected the first time it is seen.
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Summary given to events that arrive without one.
pub const UNTITLED_EVENT_SUMMARY: &str = "Untitled Event";

pub const DEFAULT_PROVIDER: &str = "google";

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

pub const SYNC_TOKENS_FILE: &str = "sync_tokens.toml";
