//! State published by the engine to its host.
//!
//! The engine is the single writer. Hosts read immutable snapshots, either on
//! demand or by subscribing to the watch channel.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::date_range::ViewMode;
use crate::event::CalendarEvent;

/// A calendar the user can show or hide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSource {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    /// Whether the calendar is part of the sync scope.
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub calendars: Vec<CalendarSource>,
    pub events: Vec<CalendarEvent>,
    pub loading: bool,
    pub error: Option<String>,
    pub view: ViewMode,
    pub anchor_date: NaiveDate,
}

impl EngineSnapshot {
    pub fn new(view: ViewMode, anchor_date: NaiveDate) -> Self {
        EngineSnapshot {
            calendars: Vec::new(),
            events: Vec::new(),
            loading: false,
            error: None,
            view,
            anchor_date,
        }
    }

    pub fn selected_calendar_ids(&self) -> Vec<String> {
        self.calendars
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn calendar(&self, id: &str) -> Option<&CalendarSource> {
        self.calendars.iter().find(|c| c.id == id)
    }

    pub fn event(&self, calendar_id: &str, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.key() == (calendar_id, id))
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        EngineSnapshot::new(ViewMode::default(), Utc::now().date_naive())
    }
}

pub(crate) struct PublishedState {
    tx: watch::Sender<EngineSnapshot>,
    loading_depth: AtomicUsize,
    /// Number of times `loading` went from false to true.
    loading_periods: AtomicUsize,
}

impl PublishedState {
    pub(crate) fn new(initial: EngineSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        PublishedState {
            tx,
            loading_depth: AtomicUsize::new(0),
            loading_periods: AtomicUsize::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> EngineSnapshot {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn modify(&self, f: impl FnOnce(&mut EngineSnapshot)) {
        self.tx.send_modify(f);
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.modify(|s| s.error = Some(message));
    }

    /// Mark an operation as in flight until the guard is dropped.
    ///
    /// Guards nest: `loading` stays true until the outermost one is dropped.
    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        if self.loading_depth.fetch_add(1, Ordering::SeqCst) == 0 {
            self.loading_periods.fetch_add(1, Ordering::SeqCst);
            self.modify(|s| s.loading = true);
        }
        LoadingGuard { state: self }
    }

    #[cfg(test)]
    pub(crate) fn loading_periods(&self) -> usize {
        self.loading_periods.load(Ordering::SeqCst)
    }
}

pub(crate) struct LoadingGuard<'a> {
    state: &'a PublishedState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.state.loading_depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.modify(|s| s.loading = false);
        }
    }
}
