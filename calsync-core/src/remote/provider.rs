//! Provider subprocess protocol.
//!
//! A provider is any executable named `calsync-provider-<name>` on `PATH`
//! that reads one JSON request line from stdin and writes one JSON response
//! to stdout. The provider owns the actual API client; the engine only hands
//! it the bearer credential with each request.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::constants::DEFAULT_PROVIDER_TIMEOUT_SECS;
use crate::date_range::TimeWindow;
use crate::error::{CalSyncError, CalSyncResult, RemoteError};
use crate::event::{EventFields, RawEvent};
use crate::remote::protocol::{
    Command, CreateEvent, DeleteEvent, ListCalendars, ListEvents, ProviderCommand, Request,
    Response, UpdateEvent,
};
use crate::remote::{EventPage, RawCalendar, RemoteCalendarService};

#[derive(Clone, Debug)]
pub struct Provider {
    name: String,
    timeout: Duration,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("calsync-provider-{}", self.name)
    }

    fn binary_path(&self) -> CalSyncResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| CalSyncError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalSyncResult<C::Response> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalSyncError::ProviderTimeout(self.timeout.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalSyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.name, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RemoteError::Request(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RemoteError::Request("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RemoteError::Request(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            ))
            .into());
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(RemoteError::Request("Provider returned no response".into()).into());
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| RemoteError::Request(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error, code } => Err(match code {
                Some(code) => code.into_remote_error(error),
                None => RemoteError::Request(error),
            }
            .into()),
        }
    }
}

/// [`RemoteCalendarService`] backed by a provider executable.
#[derive(Clone, Debug)]
pub struct ProviderService {
    provider: Provider,
}

impl ProviderService {
    pub fn new(provider: Provider) -> Self {
        ProviderService { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

fn into_remote(err: CalSyncError) -> RemoteError {
    match err {
        CalSyncError::Remote(e) => e,
        other => RemoteError::Request(other.to_string()),
    }
}

#[async_trait]
impl RemoteCalendarService for ProviderService {
    async fn list_calendars(&self, credential: &str) -> Result<Vec<RawCalendar>, RemoteError> {
        self.provider
            .call(ListCalendars {
                credential: credential.to_string(),
            })
            .await
            .map_err(into_remote)
    }

    async fn list_events(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &TimeWindow,
        sync_token: Option<&str>,
    ) -> Result<EventPage, RemoteError> {
        self.provider
            .call(ListEvents {
                credential: credential.to_string(),
                calendar_id: calendar_id.to_string(),
                time_min: window.time_min_rfc3339(),
                time_max: window.time_max_rfc3339(),
                sync_token: sync_token.map(String::from),
            })
            .await
            .map_err(into_remote)
    }

    async fn create_event(
        &self,
        credential: &str,
        calendar_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError> {
        self.provider
            .call(CreateEvent {
                credential: credential.to_string(),
                calendar_id: calendar_id.to_string(),
                fields: fields.clone(),
            })
            .await
            .map_err(into_remote)
    }

    async fn update_event(
        &self,
        credential: &str,
        calendar_id: &str,
        event_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError> {
        self.provider
            .call(UpdateEvent {
                credential: credential.to_string(),
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
                fields: fields.clone(),
            })
            .await
            .map_err(into_remote)
    }

    async fn delete_event(
        &self,
        credential: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), RemoteError> {
        self.provider
            .call(DeleteEvent {
                credential: credential.to_string(),
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            })
            .await
            .map_err(into_remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_provider_binary_is_reported() {
        let provider = Provider::from_name("definitely-not-installed-xyz");
        let err = provider
            .call(ListCalendars {
                credential: "token".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CalSyncError::ProviderNotInstalled(name) if name == "calsync-provider-definitely-not-installed-xyz"));
    }

    #[tokio::test]
    async fn test_service_maps_errors_to_remote_errors() {
        let service = ProviderService::new(Provider::from_name("definitely-not-installed-xyz"));
        let err = service.list_calendars("token").await.unwrap_err();
        assert!(matches!(err, RemoteError::Request(msg) if msg.contains("not found in PATH")));
    }
}
