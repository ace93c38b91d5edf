//! View modes and the request window they cover.
//!
//! A window is never stored: it is recomputed from the current view and
//! anchor date before every sync cycle.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, Utc,
};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_WINDOW_PADDING_DAYS, MAX_WINDOW_PADDING_DAYS};

/// The shape of the visible calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewMode {
    Day,
    ThreeDays,
    WorkWeek,
    #[default]
    Week,
    TwoWeeks,
    Month,
}

impl ViewMode {
    pub const ALL: [ViewMode; 6] = [
        ViewMode::Day,
        ViewMode::ThreeDays,
        ViewMode::WorkWeek,
        ViewMode::Week,
        ViewMode::TwoWeeks,
        ViewMode::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Day => "day",
            ViewMode::ThreeDays => "3days",
            ViewMode::WorkWeek => "workweek",
            ViewMode::Week => "week",
            ViewMode::TwoWeeks => "2weeks",
            ViewMode::Month => "month",
        }
    }

    /// Parse a view name. Unknown names fall back to [`ViewMode::Week`].
    pub fn parse_lenient(s: &str) -> ViewMode {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => ViewMode::Day,
            "3days" => ViewMode::ThreeDays,
            "workweek" => ViewMode::WorkWeek,
            "week" => ViewMode::Week,
            "2weeks" => ViewMode::TwoWeeks,
            "month" => ViewMode::Month,
            _ => ViewMode::Week,
        }
    }

    /// Move `anchor` one view-sized step forward or backward.
    pub fn step(&self, anchor: NaiveDate, forward: bool) -> NaiveDate {
        let days = match self {
            ViewMode::Day => 1,
            ViewMode::ThreeDays => 3,
            ViewMode::WorkWeek | ViewMode::Week => 7,
            ViewMode::TwoWeeks => 14,
            ViewMode::Month => {
                let moved = if forward {
                    anchor.checked_add_months(Months::new(1))
                } else {
                    anchor.checked_sub_months(Months::new(1))
                };
                return moved.unwrap_or(anchor);
            }
        };
        let delta = Duration::days(if forward { days } else { -days });
        anchor.checked_add_signed(delta).unwrap_or(anchor)
    }

    /// First and last calendar day covered by this view, before padding.
    fn base_days(&self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        let monday = start_of_week(anchor);
        match self {
            ViewMode::Day => (anchor, anchor),
            ViewMode::ThreeDays => (anchor, add_days(anchor, 2)),
            ViewMode::WorkWeek => (monday, add_days(monday, 4)),
            ViewMode::Week => (monday, add_days(monday, 6)),
            ViewMode::TwoWeeks => (monday, add_days(monday, 13)),
            ViewMode::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(anchor);
                (first, last)
            }
        }
    }
}

impl FromStr for ViewMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ViewMode::parse_lenient(s))
    }
}

impl From<String> for ViewMode {
    fn from(s: String) -> Self {
        ViewMode::parse_lenient(&s)
    }
}

impl From<ViewMode> for String {
    fn from(view: ViewMode) -> Self {
        view.as_str().to_string()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `[time_min, time_max]` request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub time_min: DateTime<FixedOffset>,
    pub time_max: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn time_min_rfc3339(&self) -> String {
        self.time_min.to_rfc3339()
    }

    pub fn time_max_rfc3339(&self) -> String {
        self.time_max.to_rfc3339()
    }

    pub fn span(&self) -> Duration {
        self.time_max - self.time_min
    }

    /// True if `other` lies entirely inside this window.
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.time_min <= other.time_min && other.time_max <= self.time_max
    }

    pub fn contains_instant(&self, instant: &DateTime<FixedOffset>) -> bool {
        self.time_min <= *instant && *instant <= self.time_max
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} .. {}", self.time_min_rfc3339(), self.time_max_rfc3339())
    }
}

/// Maps a view mode and anchor date to a padded request window.
///
/// Weeks start on Monday. Day boundaries are computed in `offset`. Windows
/// saturate at the representable date range instead of overflowing.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeResolver {
    padding: Duration,
    offset: FixedOffset,
}

impl Default for DateRangeResolver {
    fn default() -> Self {
        DateRangeResolver {
            padding: Duration::days(DEFAULT_WINDOW_PADDING_DAYS),
            offset: Utc.fix(),
        }
    }
}

impl DateRangeResolver {
    /// Padding is clamped to `0..=366` days.
    pub fn new(padding_days: i64, offset: FixedOffset) -> Self {
        let days = padding_days.clamp(0, MAX_WINDOW_PADDING_DAYS);
        DateRangeResolver {
            padding: Duration::try_days(days).unwrap_or_else(Duration::zero),
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn resolve(&self, view: ViewMode, anchor: NaiveDate) -> TimeWindow {
        let (first, last) = view.base_days(anchor);
        let start = NaiveDateTime::new(first, NaiveTime::MIN);
        let end = NaiveDateTime::new(last, end_of_day());

        let time_min = self
            .to_utc(start)
            .checked_sub_signed(self.padding)
            .unwrap_or(NaiveDateTime::MIN);
        let time_max = self
            .to_utc(end)
            .checked_add_signed(self.padding)
            .unwrap_or(NaiveDateTime::MAX);

        TimeWindow {
            time_min: DateTime::from_naive_utc_and_offset(time_min, self.offset),
            time_max: DateTime::from_naive_utc_and_offset(time_max, self.offset),
        }
    }

    fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        local.checked_sub_signed(shift).unwrap_or(if shift > Duration::zero() {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        })
    }
}

/// Resolve a window in UTC with the default padding.
pub fn resolve(view: ViewMode, anchor: NaiveDate) -> TimeWindow {
    DateRangeResolver::default().resolve(view, anchor)
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = i64::from(date.weekday().num_days_from_monday());
    add_days(date, -back)
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn instant(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn unpadded(view: ViewMode, anchor: NaiveDate) -> TimeWindow {
        DateRangeResolver::new(0, FixedOffset::east_opt(0).unwrap()).resolve(view, anchor)
    }

    #[test]
    fn test_day_window_is_padded_by_a_week() {
        let window = resolve(ViewMode::Day, date("2024-03-13"));
        assert_eq!(window.time_min, instant("2024-03-06T00:00:00Z"));
        assert_eq!(window.time_max, instant("2024-03-20T23:59:59.999Z"));
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2024-03-13 is a Wednesday
        let window = unpadded(ViewMode::Week, date("2024-03-13"));
        assert_eq!(window.time_min, instant("2024-03-11T00:00:00Z"));
        assert_eq!(window.time_max, instant("2024-03-17T23:59:59.999Z"));

        // Sunday belongs to the week that started the Monday before
        let window = unpadded(ViewMode::Week, date("2024-03-17"));
        assert_eq!(window.time_min, instant("2024-03-11T00:00:00Z"));
    }

    #[test]
    fn test_three_days_workweek_and_two_weeks() {
        let anchor = date("2024-03-13");

        let three = unpadded(ViewMode::ThreeDays, anchor);
        assert_eq!(three.time_min, instant("2024-03-13T00:00:00Z"));
        assert_eq!(three.time_max, instant("2024-03-15T23:59:59.999Z"));

        let work = unpadded(ViewMode::WorkWeek, anchor);
        assert_eq!(work.time_min, instant("2024-03-11T00:00:00Z"));
        assert_eq!(work.time_max, instant("2024-03-15T23:59:59.999Z"));

        let two = unpadded(ViewMode::TwoWeeks, anchor);
        assert_eq!(two.time_min, instant("2024-03-11T00:00:00Z"));
        assert_eq!(two.time_max, instant("2024-03-24T23:59:59.999Z"));
    }

    #[test]
    fn test_month_handles_leap_february() {
        let window = unpadded(ViewMode::Month, date("2024-02-10"));
        assert_eq!(window.time_min, instant("2024-02-01T00:00:00Z"));
        assert_eq!(window.time_max, instant("2024-02-29T23:59:59.999Z"));

        let window = unpadded(ViewMode::Month, date("2023-12-31"));
        assert_eq!(window.time_max, instant("2023-12-31T23:59:59.999Z"));
    }

    #[test]
    fn test_unknown_view_falls_back_to_week() {
        let anchor = date("2024-07-04");
        let unknown = resolve(ViewMode::parse_lenient("agenda"), anchor);
        assert_eq!(unknown, resolve(ViewMode::Week, anchor));
        assert_eq!("".parse::<ViewMode>().unwrap(), ViewMode::Week);
    }

    #[test]
    fn test_every_view_contains_anchor() {
        let anchors = ["2024-01-01", "2024-02-29", "2024-06-30", "2024-12-31"];
        for anchor in anchors.map(date) {
            let start = instant(&format!("{}T00:00:00Z", anchor));
            for view in ViewMode::ALL {
                let window = resolve(view, anchor);
                assert!(
                    window.contains_instant(&start),
                    "{view} window {window} should contain {anchor}"
                );
            }
        }
    }

    #[test]
    fn test_window_length_grows_with_view() {
        let anchor = date("2024-05-15");
        let day = resolve(ViewMode::Day, anchor).span();
        let week = resolve(ViewMode::Week, anchor).span();
        let month = resolve(ViewMode::Month, anchor).span();
        assert!(day <= week);
        assert!(week <= month);
    }

    #[test]
    fn test_month_window_strictly_contains_day_window() {
        let anchor = date("2024-05-15");
        let day = resolve(ViewMode::Day, anchor);
        let month = resolve(ViewMode::Month, anchor);
        assert!(month.contains(&day));
        assert_ne!(month, day);
    }

    #[test]
    fn test_offset_shifts_day_boundaries() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let window = DateRangeResolver::new(0, tokyo).resolve(ViewMode::Day, date("2024-03-13"));
        assert_eq!(window.time_min_rfc3339(), "2024-03-13T00:00:00+09:00");
        assert_eq!(window.time_min, instant("2024-03-12T15:00:00Z"));
    }

    #[test]
    fn test_resolve_saturates_at_date_limits() {
        for view in ViewMode::ALL {
            for anchor in [NaiveDate::MAX, NaiveDate::MIN] {
                let window = resolve(view, anchor);
                let start = NaiveDateTime::new(anchor, NaiveTime::MIN).and_utc().fixed_offset();
                assert!(window.time_min <= window.time_max);
                assert!(window.contains_instant(&start), "{view} at {anchor}");
            }
        }
    }

    #[test]
    fn test_padding_is_clamped() {
        let wide = DateRangeResolver::new(i64::MAX, Utc.fix()).resolve(ViewMode::Day, date("2024-03-13"));
        assert_eq!(wide.time_min, instant("2023-03-13T00:00:00Z"));
        assert_eq!(wide.time_max, instant("2025-03-14T23:59:59.999Z"));

        let negative = DateRangeResolver::new(-5, Utc.fix()).resolve(ViewMode::Day, date("2024-03-13"));
        assert_eq!(negative, unpadded(ViewMode::Day, date("2024-03-13")));
    }

    #[test]
    fn test_view_names_roundtrip_through_serde() {
        for view in ViewMode::ALL {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(json, format!("\"{}\"", view.as_str()));
            let back: ViewMode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, view);
        }
    }

    #[test]
    fn test_step_moves_by_view_size() {
        let anchor = date("2024-01-31");
        assert_eq!(ViewMode::Day.step(anchor, true), date("2024-02-01"));
        assert_eq!(ViewMode::ThreeDays.step(anchor, false), date("2024-01-28"));
        assert_eq!(ViewMode::TwoWeeks.step(anchor, true), date("2024-02-14"));
        // Month steps clamp to the end of shorter months
        assert_eq!(ViewMode::Month.step(anchor, true), date("2024-02-29"));
    }
}
