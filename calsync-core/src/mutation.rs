//! Create, update and delete against the remote service.
//!
//! Every successful mutation is applied to the published events right away and
//! then reconciled with an awaited full sync, so the caller observes the
//! remote's authoritative state when the call returns.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::event::{CalendarEvent, EventFields};
use crate::normalize::{merge_update_echo, normalize};
use crate::sync::SyncEngine;

pub const CREATE_FAILED: &str = "Failed to create event";
pub const UPDATE_FAILED: &str = "Failed to update event";
pub const DELETE_FAILED: &str = "Failed to delete event";

#[derive(Clone)]
pub struct MutationCoordinator {
    engine: Arc<SyncEngine>,
}

impl MutationCoordinator {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        MutationCoordinator { engine }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Create an event from its mutable fields.
    ///
    /// Returns the event as echoed by the remote, or `None` when not
    /// authenticated or on failure.
    #[instrument(skip(self, draft))]
    pub async fn create(
        &self,
        calendar_id: &str,
        draft: impl Into<EventFields>,
    ) -> Option<CalendarEvent> {
        let credential = self.engine.credential()?;
        let fields = draft.into();

        let _loading = self.engine.begin_loading();

        let echo = self
            .engine
            .service()
            .create_event(&credential, calendar_id, &fields)
            .await;

        // An echo without an id cannot be reconciled
        let created = match echo.map(|raw| normalize(raw, calendar_id)) {
            Ok(Some(event)) => event,
            Ok(None) => {
                error!(calendar_id, "created event echoed without an id");
                self.engine.publish_error(CREATE_FAILED);
                return None;
            }
            Err(e) => {
                error!(calendar_id, error = %e, "failed to create event");
                self.engine.publish_error(CREATE_FAILED);
                return None;
            }
        };

        info!(calendar_id, event_id = %created.id, "event created");
        self.engine.insert_event(created.clone());
        self.engine.sync_events(true).await;

        Some(created)
    }

    /// Update `event` remotely with its current mutable fields.
    #[instrument(skip(self, event), fields(calendar_id = %event.calendar_id, event_id = %event.id))]
    pub async fn update(&self, event: &CalendarEvent) -> Option<CalendarEvent> {
        let credential = self.engine.credential()?;
        let fields = EventFields::from(event);

        let _loading = self.engine.begin_loading();

        let echo = match self
            .engine
            .service()
            .update_event(&credential, &event.calendar_id, &event.id, &fields)
            .await
        {
            Ok(echo) => echo,
            Err(e) => {
                error!(error = %e, "failed to update event");
                self.engine.publish_error(UPDATE_FAILED);
                return None;
            }
        };

        let merged = merge_update_echo(event, echo);
        info!("event updated");
        self.engine.replace_event(merged.clone());
        self.engine.sync_events(true).await;

        Some(merged)
    }

    /// Delete `event` remotely. Returns whether the remote accepted it.
    #[instrument(skip(self, event), fields(calendar_id = %event.calendar_id, event_id = %event.id))]
    pub async fn delete(&self, event: &CalendarEvent) -> bool {
        let Some(credential) = self.engine.credential() else {
            return false;
        };

        let _loading = self.engine.begin_loading();

        if let Err(e) = self
            .engine
            .service()
            .delete_event(&credential, &event.calendar_id, &event.id)
            .await
        {
            error!(error = %e, "failed to delete event");
            self.engine.publish_error(DELETE_FAILED);
            return false;
        }

        info!("event deleted");
        self.engine.remove_event(&event.calendar_id, &event.id);
        self.engine.sync_events(true).await;

        true
    }
}
