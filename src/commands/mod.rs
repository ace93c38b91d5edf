pub mod calendars;
pub mod create;
pub mod delete;
pub mod events;
pub mod token;
pub mod update;

use std::sync::Arc;

use anyhow::{Context, Result};
use calsync_core::{
    CalendarEvent, CycleReport, EngineConfig, EventTime, MutationCoordinator, Outcome,
    ProviderService, StaticAuth, SyncEngine, ViewMode,
};
use chrono::{DateTime, NaiveDate};

/// Engine and coordinator wired from the user's config for one CLI invocation.
pub struct Session {
    pub engine: Arc<SyncEngine>,
    pub coordinator: MutationCoordinator,
    authenticated: bool,
}

impl Session {
    pub fn open(token: Option<String>) -> Result<Self> {
        let config = EngineConfig::load()?;
        let authenticated = token.is_some();
        let auth = match token {
            Some(token) => StaticAuth::new(token),
            None => StaticAuth::anonymous(),
        };

        let service = ProviderService::new(config.provider());
        let engine = SyncEngine::from_config(&config, Arc::new(service), Arc::new(auth))?;

        Ok(Session::new(Arc::new(engine), authenticated))
    }

    pub fn new(engine: Arc<SyncEngine>, authenticated: bool) -> Self {
        Session {
            coordinator: MutationCoordinator::new(engine.clone()),
            engine,
            authenticated,
        }
    }

    pub fn require_auth(&self) -> Result<()> {
        if !self.authenticated {
            anyhow::bail!(
                "No credential given.\n\n\
                Pass one with:\n  \
                calsync --token <TOKEN> <command>\n\n\
                or set CALSYNC_ACCESS_TOKEN."
            );
        }
        Ok(())
    }

    /// Sync the calendar list and, if `only` is non-empty, select exactly those calendars.
    pub async fn load_calendars(&self, only: &[String]) -> Result<()> {
        expect_completed(self.engine.sync_calendar_list().await)?;

        if !only.is_empty() {
            for cal in self.engine.calendars() {
                self.engine
                    .set_calendar_selected(&cal.id, only.contains(&cal.id))?;
            }
            for id in only {
                if self.engine.snapshot().calendar(id).is_none() {
                    let available: Vec<_> =
                        self.engine.calendars().into_iter().map(|c| c.id).collect();
                    anyhow::bail!(
                        "Calendar '{}' not found. Available: {}",
                        id,
                        available.join(", ")
                    );
                }
            }
        }
        Ok(())
    }

    /// Sync the events of the requested window.
    ///
    /// A fresh process has no published events, so a listing is a full fetch.
    /// With `incremental` only the changes since the stored tokens are fetched.
    pub async fn load_window(
        &self,
        view: Option<&str>,
        date: Option<&str>,
        incremental: bool,
        calendars: &[String],
    ) -> Result<CycleReport> {
        self.load_calendars(calendars).await?;

        if let Some(view) = view {
            self.engine.set_view(ViewMode::parse_lenient(view));
        }
        if let Some(date) = date {
            self.engine.set_anchor_date(parse_date(date)?);
        }

        expect_completed(self.engine.sync_events(!incremental).await)
    }

    /// Load the events of `calendar_id` around `date` and find `event_id` among them.
    pub async fn find_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        date: Option<&str>,
    ) -> Result<CalendarEvent> {
        self.load_calendars(&[calendar_id.to_string()]).await?;
        if let Some(date) = date {
            self.engine.set_anchor_date(parse_date(date)?);
        }
        // Stored tokens would only return changes, not the event being looked up
        expect_completed(self.engine.sync_events(true).await)?;

        self.engine
            .snapshot()
            .event(calendar_id, event_id)
            .cloned()
            .with_context(|| {
                format!(
                    "Event '{}' not found in {} around {}. Pass --date to look elsewhere.",
                    event_id,
                    calendar_id,
                    self.engine.snapshot().anchor_date
                )
            })
    }
}

pub fn expect_completed<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Completed(value) => Ok(value),
        Outcome::Failed(message) => anyhow::bail!(message),
        Outcome::Skipped => anyhow::bail!("Not authenticated"),
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// `YYYY-MM-DD` is an all-day marker, anything else must be RFC 3339.
pub fn parse_event_time(s: &str) -> Result<EventTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(EventTime::Date(date));
    }
    DateTime::parse_from_rfc3339(s)
        .map(EventTime::DateTime)
        .with_context(|| format!("Invalid time '{}', expected YYYY-MM-DD or RFC 3339", s))
}

/// Keep the zone of `current` when a new instant replaces a zoned time.
pub fn keep_time_zone(current: &EventTime, new: EventTime) -> EventTime {
    match (current, new) {
        (EventTime::DateTimeZoned { time_zone, .. }, EventTime::DateTime(date_time)) => {
            EventTime::DateTimeZoned {
                date_time,
                time_zone: time_zone.clone(),
            }
        }
        (_, new) => new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use calsync_core::{
        EventFields, EventPage, RawCalendar, RawEvent, RemoteCalendarService, RemoteError,
        SyncTokenStore,
    };

    /// Remote holding `work/e1`, which answers a stored token with an empty delta.
    #[derive(Default)]
    struct UnchangedRemote {
        tokens_sent: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl RemoteCalendarService for UnchangedRemote {
        async fn list_calendars(&self, _: &str) -> Result<Vec<RawCalendar>, RemoteError> {
            Ok(vec![RawCalendar {
                id: "work".into(),
                summary: "Work".into(),
                description: None,
                background_color: None,
                foreground_color: None,
            }])
        }

        async fn list_events(
            &self,
            _: &str,
            _: &str,
            _: &calsync_core::TimeWindow,
            sync_token: Option<&str>,
        ) -> Result<EventPage, RemoteError> {
            self.tokens_sent.lock().unwrap().push(sync_token.map(String::from));
            let events = match sync_token {
                Some(_) => vec![],
                None => vec![RawEvent {
                    id: Some("e1".into()),
                    summary: Some("Standup".into()),
                    ..Default::default()
                }],
            };
            Ok(EventPage {
                events,
                next_sync_token: Some("T2".into()),
            })
        }

        async fn create_event(&self, _: &str, _: &str, _: &EventFields) -> Result<RawEvent, RemoteError> {
            Err(RemoteError::Request("unused".into()))
        }

        async fn update_event(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &EventFields,
        ) -> Result<RawEvent, RemoteError> {
            Err(RemoteError::Request("unused".into()))
        }

        async fn delete_event(&self, _: &str, _: &str, _: &str) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    /// A session as a later run sees it: a token from an earlier run is on disk.
    fn session_after_previous_run(remote: Arc<UnchangedRemote>) -> Session {
        let mut tokens = SyncTokenStore::new();
        tokens.set("work", "T1");
        let engine = SyncEngine::new(remote, Arc::new(StaticAuth::new("token")))
            .with_token_store(tokens)
            .with_view(ViewMode::Week, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        Session::new(Arc::new(engine), true)
    }

    #[tokio::test]
    async fn test_find_event_ignores_stored_tokens() {
        let remote = Arc::new(UnchangedRemote::default());
        let session = session_after_previous_run(remote.clone());

        let event = session.find_event("work", "e1", None).await.unwrap();

        assert_eq!(event.summary, "Standup");
        assert_eq!(*remote.tokens_sent.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_listing_is_full_unless_incremental() {
        let remote = Arc::new(UnchangedRemote::default());
        let session = session_after_previous_run(remote.clone());

        let work = ["work".to_string()];
        session.load_window(None, None, false, &work).await.unwrap();
        assert_eq!(session.engine.events().len(), 1);

        let report = session.load_window(None, None, true, &work).await.unwrap();
        assert_eq!(report.event_count(), 0);
        assert_eq!(
            *remote.tokens_sent.lock().unwrap(),
            vec![None, Some("T2".to_string())]
        );
    }

    #[test]
    fn test_new_instant_keeps_zone() {
        let zoned = EventTime::DateTimeZoned {
            date_time: DateTime::parse_from_rfc3339("2024-03-04T09:00:00-05:00").unwrap(),
            time_zone: "America/New_York".into(),
        };
        let moved = keep_time_zone(&zoned, parse_event_time("2024-03-05T10:00:00-05:00").unwrap());
        assert!(matches!(moved, EventTime::DateTimeZoned { time_zone, .. } if time_zone == "America/New_York"));

        let all_day = keep_time_zone(&zoned, parse_event_time("2024-03-05").unwrap());
        assert!(all_day.is_all_day());
    }

    #[test]
    fn test_parse_event_time() {
        assert!(matches!(parse_event_time("2025-03-20").unwrap(), EventTime::Date(_)));
        assert!(matches!(
            parse_event_time("2025-03-20T15:00:00+01:00").unwrap(),
            EventTime::DateTime(_)
        ));
        assert!(parse_event_time("tomorrow").is_err());
    }
}
