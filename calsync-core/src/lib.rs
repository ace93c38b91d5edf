//! Incremental calendar sync engine.
//!
//! This crate mirrors a remote calendar provider into local state:
//! - `SyncEngine` syncs the calendar list and the events of selected calendars,
//!   incrementally via sync tokens where possible
//! - `MutationCoordinator` creates, updates and deletes events, then reconciles
//! - `AutoSync` reruns event cycles when auth, selection or view change

pub mod auth;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod mutation;
pub mod normalize;
pub mod remote;
pub mod state;
pub mod sync;
pub mod sync_token;
pub mod trigger;

pub use auth::{AuthProvider, AuthState, AuthStore, StaticAuth};
pub use config::EngineConfig;
pub use date_range::{DateRangeResolver, TimeWindow, ViewMode};
pub use error::{CalSyncError, CalSyncResult, RemoteError};
pub use event::{Attendee, CalendarEvent, EventFields, EventTime, RawEvent, RawEventTime};
pub use mutation::MutationCoordinator;
pub use remote::{EventPage, Provider, ProviderService, RawCalendar, RemoteCalendarService};
pub use state::{CalendarSource, EngineSnapshot};
pub use sync::{CycleReport, Direction, Outcome, SyncEngine};
pub use sync_token::SyncTokenStore;
pub use trigger::{AutoSync, SyncTrigger, TriggerInputs};
