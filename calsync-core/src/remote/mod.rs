//! The remote calendar service boundary.
//!
//! The engine only talks to the provider through [`RemoteCalendarService`],
//! which is injected at construction. [`ProviderService`] is the shipped
//! implementation; tests use an in-memory double.

pub mod protocol;
pub mod provider;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::date_range::TimeWindow;
use crate::error::RemoteError;
use crate::event::{EventFields, RawEvent};

pub use provider::{Provider, ProviderService};

/// Calendar as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub foreground_color: Option<String>,
}

/// One `list_events` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub next_sync_token: Option<String>,
}

/// Operations the engine needs from a calendar provider.
///
/// `list_events` must fail with [`RemoteError::SyncTokenInvalid`] when the
/// supplied token is stale; any other failure is treated as generic.
#[async_trait]
pub trait RemoteCalendarService: Send + Sync {
    async fn list_calendars(&self, credential: &str) -> Result<Vec<RawCalendar>, RemoteError>;

    async fn list_events(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &TimeWindow,
        sync_token: Option<&str>,
    ) -> Result<EventPage, RemoteError>;

    async fn create_event(
        &self,
        credential: &str,
        calendar_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError>;

    async fn update_event(
        &self,
        credential: &str,
        calendar_id: &str,
        event_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError>;

    async fn delete_event(
        &self,
        credential: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), RemoteError>;
}
