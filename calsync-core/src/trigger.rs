//! Edge-triggered automatic event sync.
//!
//! The engine never syncs on its own. A host that wants the reactive
//! behavior spawns [`AutoSync`], which watches the auth feed and the engine's
//! published state and runs one non-forced cycle per qualifying transition.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::auth::AuthState;
use crate::date_range::ViewMode;
use crate::state::EngineSnapshot;
use crate::sync::SyncEngine;

/// The inputs whose changes can trigger a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInputs {
    pub authenticated: bool,
    pub has_calendars: bool,
    pub selected: BTreeSet<String>,
    pub view: ViewMode,
    pub anchor_date: NaiveDate,
}

impl TriggerInputs {
    pub fn from_state(auth: &AuthState, snapshot: &EngineSnapshot) -> Self {
        TriggerInputs {
            authenticated: auth.is_authenticated,
            has_calendars: !snapshot.calendars.is_empty(),
            selected: snapshot.selected_calendar_ids().into_iter().collect(),
            view: snapshot.view,
            anchor_date: snapshot.anchor_date,
        }
    }
}

/// Decides whether a new set of inputs is a qualifying transition.
#[derive(Debug, Default)]
pub struct SyncTrigger {
    last: Option<TriggerInputs>,
}

impl SyncTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `inputs` and return whether a cycle should run.
    ///
    /// Fires when the inputs differ from the last observed ones and the
    /// engine is authenticated with at least one calendar. Loading, error and
    /// event changes are not part of the inputs, so a cycle's own publications
    /// never re-trigger it.
    pub fn observe(&mut self, inputs: TriggerInputs) -> bool {
        let changed = self.last.as_ref() != Some(&inputs);
        let ready = inputs.authenticated && inputs.has_calendars;
        self.last = Some(inputs);
        changed && ready
    }
}

pub struct AutoSync;

impl AutoSync {
    /// Run the trigger loop until either feed closes.
    pub fn spawn(engine: Arc<SyncEngine>, mut auth: watch::Receiver<AuthState>) -> JoinHandle<()> {
        let mut state = engine.subscribe();

        tokio::spawn(async move {
            let mut trigger = SyncTrigger::new();

            loop {
                let inputs = {
                    let auth = auth.borrow_and_update();
                    let snapshot = state.borrow_and_update();
                    TriggerInputs::from_state(&auth, &snapshot)
                };

                if trigger.observe(inputs) {
                    debug!("sync inputs changed, running event cycle");
                    engine.sync_events(false).await;
                }

                tokio::select! {
                    changed = auth.changed() => if changed.is_err() { break },
                    changed = state.changed() => if changed.is_err() { break },
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::auth::AuthStore;
    use crate::remote::mock::{MockService, calendar};

    fn inputs(authenticated: bool, selected: &[&str]) -> TriggerInputs {
        TriggerInputs {
            authenticated,
            has_calendars: true,
            selected: selected.iter().map(|s| s.to_string()).collect(),
            view: ViewMode::Week,
            anchor_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_fires_once_per_transition() {
        let mut trigger = SyncTrigger::new();
        assert!(!trigger.observe(inputs(false, &["primary"])));
        assert!(trigger.observe(inputs(true, &["primary"])));
        assert!(!trigger.observe(inputs(true, &["primary"])));
        assert!(trigger.observe(inputs(true, &["primary", "work"])));

        let mut moved = inputs(true, &["primary", "work"]);
        moved.view = ViewMode::Month;
        assert!(trigger.observe(moved.clone()));
        moved.anchor_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(trigger.observe(moved));
    }

    #[test]
    fn test_no_calendars_never_fires() {
        let mut trigger = SyncTrigger::new();
        let mut empty = inputs(true, &[]);
        empty.has_calendars = false;
        assert!(!trigger.observe(empty));
    }

    async fn wait_for(service: &MockService, count: usize) {
        for _ in 0..100 {
            if service.list_events_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_auto_sync_reacts_to_auth_and_view_changes() {
        let service = Arc::new(MockService::new());
        let auth = Arc::new(AuthStore::new());
        let engine = Arc::new(SyncEngine::new(service.clone(), auth.clone()));
        let handle = AutoSync::spawn(engine.clone(), auth.subscribe());

        service.set_calendars(Ok(vec![calendar("primary")]));
        auth.set_auth("token", "me@example.com");
        engine.sync_calendar_list().await;

        wait_for(&service, 1).await;
        assert_eq!(service.list_events_count(), 1);

        engine.set_view(ViewMode::Month);
        wait_for(&service, 2).await;
        assert_eq!(service.list_events_count(), 2);

        // Error and loading changes are not inputs
        engine.clear_error();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.list_events_count(), 2);

        handle.abort();
    }
}
