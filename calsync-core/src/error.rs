//! Error types for the calsync engine.

use thiserror::Error;

/// Errors that can occur while configuring or running the engine.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Sync token store error: {0}")]
    TokenStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;

/// Failures reported by a [`RemoteCalendarService`](crate::remote::RemoteCalendarService).
///
/// `SyncTokenInvalid` is the one condition the engine recovers from on its own;
/// everything else is reported to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The supplied sync token expired or was invalidated (HTTP 410 Gone).
    #[error("Sync token is no longer valid")]
    SyncTokenInvalid,

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl RemoteError {
    pub fn is_sync_token_invalid(&self) -> bool {
        matches!(self, RemoteError::SyncTokenInvalid)
    }
}
