//! Scripted in-memory service for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::date_range::TimeWindow;
use crate::error::RemoteError;
use crate::event::{EventFields, RawEvent};
use crate::remote::{EventPage, RawCalendar, RemoteCalendarService};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ListCalendars,
    ListEvents {
        calendar_id: String,
        sync_token: Option<String>,
        window: TimeWindow,
    },
    Create {
        calendar_id: String,
        fields: EventFields,
    },
    Update {
        calendar_id: String,
        event_id: String,
        fields: EventFields,
    },
    Delete {
        calendar_id: String,
        event_id: String,
    },
}

#[derive(Default)]
struct Script {
    calendars: Option<Result<Vec<RawCalendar>, RemoteError>>,
    /// Queued responses per calendar; an empty queue answers with an empty page.
    pages: HashMap<String, VecDeque<Result<EventPage, RemoteError>>>,
    create: Option<Result<RawEvent, RemoteError>>,
    update: Option<Result<RawEvent, RemoteError>>,
    delete: Option<Result<(), RemoteError>>,
    calls: Vec<Call>,
}

type Hook = Box<dyn Fn(&Call) + Send + Sync>;

#[derive(Default)]
pub(crate) struct MockService {
    script: Mutex<Script>,
    /// Runs on every call, after it is recorded and outside the script lock.
    hook: Mutex<Option<Hook>>,
}

impl MockService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub(crate) fn set_hook(&self, hook: impl Fn(&Call) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    fn record(&self, call: Call) {
        self.script().calls.push(call.clone());
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&call);
        }
    }

    pub(crate) fn set_calendars(&self, calendars: Result<Vec<RawCalendar>, RemoteError>) {
        self.script().calendars = Some(calendars);
    }

    pub(crate) fn push_page(&self, calendar_id: &str, page: Result<EventPage, RemoteError>) {
        self.script()
            .pages
            .entry(calendar_id.to_string())
            .or_default()
            .push_back(page);
    }

    pub(crate) fn set_create(&self, response: Result<RawEvent, RemoteError>) {
        self.script().create = Some(response);
    }

    pub(crate) fn set_update(&self, response: Result<RawEvent, RemoteError>) {
        self.script().update = Some(response);
    }

    pub(crate) fn set_delete(&self, response: Result<(), RemoteError>) {
        self.script().delete = Some(response);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    /// Tokens sent with each `list_events` call for `calendar_id`, in order.
    pub(crate) fn tokens_sent(&self, calendar_id: &str) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListEvents {
                    calendar_id: id,
                    sync_token,
                    ..
                } if id == calendar_id => Some(sync_token),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn list_events_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ListEvents { .. }))
            .count()
    }

    pub(crate) fn clear_calls(&self) {
        self.script().calls.clear();
    }
}

pub(crate) fn calendar(id: &str) -> RawCalendar {
    RawCalendar {
        id: id.to_string(),
        summary: id.to_string(),
        description: None,
        background_color: None,
        foreground_color: None,
    }
}

pub(crate) fn raw_event(id: &str, summary: &str) -> RawEvent {
    RawEvent {
        id: Some(id.to_string()),
        summary: Some(summary.to_string()),
        ..Default::default()
    }
}

pub(crate) fn page(events: Vec<RawEvent>, token: Option<&str>) -> EventPage {
    EventPage {
        events,
        next_sync_token: token.map(String::from),
    }
}

#[async_trait]
impl RemoteCalendarService for MockService {
    async fn list_calendars(&self, _credential: &str) -> Result<Vec<RawCalendar>, RemoteError> {
        self.record(Call::ListCalendars);
        self.script().calendars.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_events(
        &self,
        _credential: &str,
        calendar_id: &str,
        window: &TimeWindow,
        sync_token: Option<&str>,
    ) -> Result<EventPage, RemoteError> {
        self.record(Call::ListEvents {
            calendar_id: calendar_id.to_string(),
            sync_token: sync_token.map(String::from),
            window: *window,
        });
        self.script()
            .pages
            .get_mut(calendar_id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(EventPage::default()))
    }

    async fn create_event(
        &self,
        _credential: &str,
        calendar_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError> {
        self.record(Call::Create {
            calendar_id: calendar_id.to_string(),
            fields: fields.clone(),
        });
        self.script()
            .create
            .clone()
            .unwrap_or_else(|| Err(RemoteError::Request("no create response scripted".into())))
    }

    async fn update_event(
        &self,
        _credential: &str,
        calendar_id: &str,
        event_id: &str,
        fields: &EventFields,
    ) -> Result<RawEvent, RemoteError> {
        self.record(Call::Update {
            calendar_id: calendar_id.to_string(),
            event_id: event_id.to_string(),
            fields: fields.clone(),
        });
        self.script()
            .update
            .clone()
            .unwrap_or_else(|| Err(RemoteError::Request("no update response scripted".into())))
    }

    async fn delete_event(
        &self,
        _credential: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), RemoteError> {
        self.record(Call::Delete {
            calendar_id: calendar_id.to_string(),
            event_id: event_id.to_string(),
        });
        self.script().delete.clone().unwrap_or(Ok(()))
    }
}
