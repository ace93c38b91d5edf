//! Calendar-list and event synchronization.
//!
//! The engine owns the published calendars, the merged event collection and
//! the sync token map. Each event cycle fetches every selected calendar in the
//! current view window, incrementally when a token is stored, and falls back to
//! a single full fetch when the remote rejects the token.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::AuthProvider;
use crate::config::EngineConfig;
use crate::constants::PRIMARY_CALENDAR_ID;
use crate::date_range::{DateRangeResolver, TimeWindow, ViewMode};
use crate::error::{CalSyncError, CalSyncResult, RemoteError};
use crate::event::CalendarEvent;
use crate::normalize::normalize_all;
use crate::remote::{RawCalendar, RemoteCalendarService};
use crate::state::{CalendarSource, EngineSnapshot, LoadingGuard, PublishedState};
use crate::sync_token::SyncTokenStore;

pub const CALENDARS_FAILED: &str = "Failed to sync calendars";
pub const EVENTS_FAILED: &str = "Failed to sync events";

/// Result of an engine operation that never propagates errors to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Not authenticated; nothing was attempted.
    Skipped,
    Completed(T),
    /// The operation failed; the message was also published as the engine error.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// Whether a calendar was fetched with or without a sync token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Incremental,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarOutcome {
    Synced {
        events: Vec<CalendarEvent>,
        mode: FetchMode,
        /// The stored token was rejected and a full fetch was made instead.
        retried: bool,
    },
    Failed {
        error: RemoteError,
        retried: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSyncResult {
    pub calendar_id: String,
    pub outcome: CalendarOutcome,
}

impl CalendarSyncResult {
    pub fn events(&self) -> &[CalendarEvent] {
        match &self.outcome {
            CalendarOutcome::Synced { events, .. } => events,
            CalendarOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.outcome, CalendarOutcome::Synced { .. })
    }
}

/// What one `sync_events` cycle did, per calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub window: TimeWindow,
    pub full_sync: bool,
    pub calendars: Vec<CalendarSyncResult>,
}

impl CycleReport {
    pub fn event_count(&self) -> usize {
        self.calendars.iter().map(|c| c.events().len()).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CalendarSyncResult> {
        self.calendars.iter().filter(|c| !c.is_synced())
    }

    pub fn result_for(&self, calendar_id: &str) -> Option<&CalendarSyncResult> {
        self.calendars.iter().find(|c| c.calendar_id == calendar_id)
    }
}

/// Step used by [`SyncEngine::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
    Today,
}

pub struct SyncEngine {
    service: Arc<dyn RemoteCalendarService>,
    auth: Arc<dyn AuthProvider>,
    resolver: DateRangeResolver,
    tokens: Mutex<SyncTokenStore>,
    state: PublishedState,
    /// Serializes event cycles so no cycle reads a token another one is rewriting.
    cycle: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(service: Arc<dyn RemoteCalendarService>, auth: Arc<dyn AuthProvider>) -> Self {
        SyncEngine {
            service,
            auth,
            resolver: DateRangeResolver::default(),
            tokens: Mutex::new(SyncTokenStore::new()),
            state: PublishedState::new(EngineSnapshot::default()),
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine wired from configuration, with the token map loaded from disk.
    pub fn from_config(
        config: &EngineConfig,
        service: Arc<dyn RemoteCalendarService>,
        auth: Arc<dyn AuthProvider>,
    ) -> CalSyncResult<Self> {
        let tokens = SyncTokenStore::load(config.token_store_path())?;
        Ok(SyncEngine::new(service, auth)
            .with_resolver(config.resolver())
            .with_token_store(tokens)
            .with_view(config.default_view, Utc::now().date_naive()))
    }

    pub fn with_resolver(mut self, resolver: DateRangeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_token_store(mut self, tokens: SyncTokenStore) -> Self {
        self.tokens = Mutex::new(tokens);
        self
    }

    pub fn with_view(self, view: ViewMode, anchor_date: NaiveDate) -> Self {
        self.state.modify(|s| {
            s.view = view;
            s.anchor_date = anchor_date;
        });
        self
    }

    // PUBLISHED STATE:

    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.state.subscribe()
    }

    pub fn calendars(&self) -> Vec<CalendarSource> {
        self.snapshot().calendars
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.snapshot().events
    }

    /// Stored token for a calendar. Diagnostics only.
    pub fn sync_token(&self, calendar_id: &str) -> Option<String> {
        self.tokens().get(calendar_id).map(String::from)
    }

    /// Window the next cycle will request.
    pub fn current_window(&self) -> TimeWindow {
        let snapshot = self.snapshot();
        self.resolver.resolve(snapshot.view, snapshot.anchor_date)
    }

    pub fn clear_error(&self) {
        self.state.modify(|s| s.error = None);
    }

    // VIEW STATE:

    pub fn set_view(&self, view: ViewMode) {
        self.state.modify(|s| s.view = view);
    }

    pub fn set_anchor_date(&self, anchor_date: NaiveDate) {
        self.state.modify(|s| s.anchor_date = anchor_date);
    }

    pub fn navigate(&self, direction: Direction) {
        self.state.modify(|s| {
            s.anchor_date = match direction {
                Direction::Previous => s.view.step(s.anchor_date, false),
                Direction::Next => s.view.step(s.anchor_date, true),
                Direction::Today => Utc::now().date_naive(),
            };
        });
    }

    pub fn set_calendar_selected(&self, calendar_id: &str, selected: bool) -> CalSyncResult<()> {
        if self.snapshot().calendar(calendar_id).is_none() {
            return Err(CalSyncError::CalendarNotFound(calendar_id.to_string()));
        }
        self.state.modify(|s| {
            if let Some(cal) = s.calendars.iter_mut().find(|c| c.id == calendar_id) {
                cal.selected = selected;
            }
        });
        Ok(())
    }

    // SYNC OPERATIONS:

    /// Refresh the calendar list, keeping each calendar's `selected` flag.
    ///
    /// Calendars seen for the first time are selected only if they are `primary`.
    #[instrument(skip(self))]
    pub async fn sync_calendar_list(&self) -> Outcome<Vec<CalendarSource>> {
        let Some(credential) = self.credential() else {
            debug!("not authenticated, skipping calendar list sync");
            return Outcome::Skipped;
        };

        let _loading = self.state.begin_loading();

        match self.service.list_calendars(&credential).await {
            Ok(remote) => {
                let previous = self.snapshot().calendars;
                let calendars = merge_calendar_list(&previous, remote);
                info!(count = calendars.len(), "calendar list synced");
                self.state.modify(|s| s.calendars = calendars.clone());
                Outcome::Completed(calendars)
            }
            Err(e) => {
                error!(error = %e, "failed to sync calendars");
                self.state.set_error(CALENDARS_FAILED);
                Outcome::Failed(CALENDARS_FAILED.to_string())
            }
        }
    }

    /// Run one event cycle over every selected calendar.
    ///
    /// With `full_sync` no stored token is read. Failures of single calendars
    /// are reported in the [`CycleReport`] and do not abort the cycle.
    #[instrument(skip(self))]
    pub async fn sync_events(&self, full_sync: bool) -> Outcome<CycleReport> {
        let Some(credential) = self.credential() else {
            debug!("not authenticated, skipping event sync");
            return Outcome::Skipped;
        };

        let _cycle = self.cycle.lock().await;
        let _loading = self.state.begin_loading();

        let snapshot = self.snapshot();
        let window = self.resolver.resolve(snapshot.view, snapshot.anchor_date);
        let selected = snapshot.selected_calendar_ids();

        debug!(%window, calendars = selected.len(), "starting event cycle");

        let results = join_all(
            selected
                .iter()
                .map(|id| self.sync_calendar(&credential, id, &window, full_sync)),
        )
        .await;

        let events: Vec<CalendarEvent> = results
            .iter()
            .flat_map(|r| r.events().iter().cloned())
            .collect();

        let report = CycleReport {
            window,
            full_sync,
            calendars: results,
        };

        info!(
            events = events.len(),
            failed = report.failed().count(),
            "event cycle complete"
        );

        // In-memory tokens already moved past these events, so they are
        // published even if the token file cannot be written.
        self.state.modify(|s| s.events = events);

        if let Err(e) = self.persist_tokens() {
            error!(error = %e, "failed to persist sync tokens");
            self.state.set_error(EVENTS_FAILED);
            return Outcome::Failed(EVENTS_FAILED.to_string());
        }

        Outcome::Completed(report)
    }

    async fn sync_calendar(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &TimeWindow,
        full_sync: bool,
    ) -> CalendarSyncResult {
        let token = if full_sync {
            None
        } else {
            self.sync_token(calendar_id)
        };
        let mode = if token.is_some() {
            FetchMode::Incremental
        } else {
            FetchMode::Full
        };

        let mut retried = false;
        let mut response = self
            .service
            .list_events(credential, calendar_id, window, token.as_deref())
            .await;

        if matches!(&response, Err(e) if e.is_sync_token_invalid()) {
            warn!(calendar_id, "sync token invalid, retrying with full fetch");
            self.tokens().invalidate(calendar_id);
            retried = true;
            response = self
                .service
                .list_events(credential, calendar_id, window, None)
                .await;
        }

        let outcome = match response {
            Ok(page) => {
                if let Some(next) = page.next_sync_token {
                    self.tokens().set(calendar_id, next);
                }
                let events = normalize_all(page.events, calendar_id);
                debug!(calendar_id, events = events.len(), ?mode, retried, "calendar synced");
                CalendarOutcome::Synced {
                    events,
                    mode,
                    retried,
                }
            }
            Err(error) => {
                warn!(calendar_id, %error, retried, "failed to sync calendar");
                CalendarOutcome::Failed { error, retried }
            }
        };

        CalendarSyncResult {
            calendar_id: calendar_id.to_string(),
            outcome,
        }
    }

    // HOOKS FOR MUTATIONS:

    /// Credential to use, or `None` when the auth collaborator says we are signed out.
    pub(crate) fn credential(&self) -> Option<String> {
        if !self.auth.is_authenticated() {
            return None;
        }
        self.auth.credential()
    }

    pub(crate) fn service(&self) -> &dyn RemoteCalendarService {
        self.service.as_ref()
    }

    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        self.state.begin_loading()
    }

    #[cfg(test)]
    pub(crate) fn loading_periods(&self) -> usize {
        self.state.loading_periods()
    }

    pub(crate) fn publish_error(&self, message: &str) {
        self.state.set_error(message);
    }

    pub(crate) fn insert_event(&self, event: CalendarEvent) {
        self.state.modify(|s| s.events.push(event));
    }

    pub(crate) fn replace_event(&self, event: CalendarEvent) {
        self.state.modify(|s| {
            if let Some(existing) = s.events.iter_mut().find(|e| e.key() == event.key()) {
                *existing = event;
            }
        });
    }

    pub(crate) fn remove_event(&self, calendar_id: &str, event_id: &str) {
        self.state
            .modify(|s| s.events.retain(|e| e.key() != (calendar_id, event_id)));
    }

    fn tokens(&self) -> MutexGuard<'_, SyncTokenStore> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist_tokens(&self) -> CalSyncResult<()> {
        self.tokens().save()
    }
}

fn merge_calendar_list(previous: &[CalendarSource], remote: Vec<RawCalendar>) -> Vec<CalendarSource> {
    remote
        .into_iter()
        .map(|cal| {
            let selected = previous
                .iter()
                .find(|c| c.id == cal.id)
                .map(|c| c.selected)
                .unwrap_or(cal.id == PRIMARY_CALENDAR_ID);

            CalendarSource {
                id: cal.id,
                summary: cal.summary,
                description: cal.description,
                background_color: cal.background_color,
                foreground_color: cal.foreground_color,
                selected,
            }
        })
        .collect()
}
