//! Defines the JSON protocol used between the engine and provider binaries
//! over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::RemoteError;
use crate::event::{EventFields, RawEvent};
use crate::remote::{EventPage, RawCalendar};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListCalendars,
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Request sent from the engine to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider to the engine.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
}

/// Machine-readable failure reason. Providers may send an HTTP status or a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Status(u16),
    Name(String),
}

impl ErrorCode {
    pub fn into_remote_error(self, message: String) -> RemoteError {
        match self {
            ErrorCode::Status(410) => RemoteError::SyncTokenInvalid,
            ErrorCode::Status(401) | ErrorCode::Status(403) => RemoteError::Unauthorized(message),
            ErrorCode::Name(name) => match name.as_str() {
                "sync_token_invalid" | "gone" => RemoteError::SyncTokenInvalid,
                "unauthorized" => RemoteError::Unauthorized(message),
                _ => RemoteError::Request(message),
            },
            ErrorCode::Status(_) => RemoteError::Request(message),
        }
    }
}

/// List all calendars visible to the credential.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCalendars {
    pub credential: String,
}

impl ProviderCommand for ListCalendars {
    type Response = Vec<RawCalendar>;
    fn command() -> Command {
        Command::ListCalendars
    }
}

/// List events in a window, incrementally when a sync token is given.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    pub credential: String,
    pub calendar_id: String,
    pub time_min: String,
    pub time_max: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
}

impl ProviderCommand for ListEvents {
    type Response = EventPage;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a new event.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    pub credential: String,
    pub calendar_id: String,
    pub fields: EventFields,
}

impl ProviderCommand for CreateEvent {
    type Response = RawEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Update an existing event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub credential: String,
    pub calendar_id: String,
    pub event_id: String,
    pub fields: EventFields,
}

impl ProviderCommand for UpdateEvent {
    type Response = RawEvent;
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Delete an event by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub credential: String,
    pub calendar_id: String,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
