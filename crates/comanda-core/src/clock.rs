//! # Clock and Business Day
//!
//! Source of "now" and of the local calendar day used by the daily
//! uniqueness rule.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  now = 2026-10-18T02:30:00Z, zone = -03:00                              │
//! │                                                                         │
//! │  business_day  = 2026-10-17   (23:30 local)                             │
//! │  day_window    = [2026-10-17T03:00:00.000Z, 2026-10-18T02:59:59.999Z]   │
//! │                                                                         │
//! │  Zones with DST: each end of the window uses the offset in force at     │
//! │  that local midnight, so a transition day spans 23 or 25 hours. A       │
//! │  midnight skipped by the transition starts the day at the first local   │
//! │  time that exists.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trait is the only place that reads wall-clock time; everything else
//! takes instants as arguments.

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Longest stretch of local time a transition may skip at midnight.
const MAX_GAP_MINUTES: i64 = 24 * 60;

// =============================================================================
// Day Window
// =============================================================================

/// An inclusive `[start, end]` range of instants covering one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    /// Last millisecond of the day (23:59:59.999 local).
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// True if `instant` falls inside the window (both ends inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Calendar date of `instant` in `zone`.
pub fn business_day<Tz: TimeZone>(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

/// The window of instants belonging to `day` in `zone`.
pub fn day_window<Tz: TimeZone>(day: NaiveDate, zone: Tz) -> DayWindow {
    let start = start_of_day(day, &zone);
    let next = day
        .succ_opt()
        .map(|next| start_of_day(next, &zone))
        .unwrap_or_else(|| start + Duration::days(1));

    DayWindow {
        start,
        end: next - Duration::milliseconds(1),
    }
}

fn start_of_day<Tz: TimeZone>(day: NaiveDate, zone: &Tz) -> DateTime<Utc> {
    let midnight: NaiveDateTime = day.and_time(NaiveTime::MIN);

    (0..=MAX_GAP_MINUTES)
        .map(|minutes| midnight + Duration::minutes(minutes))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

// =============================================================================
// Clock
// =============================================================================

/// Time source for timestamps and "today".
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date of `instant`.
    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate;

    /// Instants that belong to the local calendar date `day`.
    fn window_of(&self, day: NaiveDate) -> DayWindow;

    /// Today's local calendar date.
    fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }

    /// Today's `[start, end]` window.
    fn today_window(&self) -> DayWindow {
        self.window_of(self.today())
    }
}

/// Wall clock, local calendar from the operating system (or a fixed
/// override when the host timezone is not the store's).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset_override: Option<FixedOffset>,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock::default()
    }

    /// Uses a fixed offset (in minutes east of UTC) instead of the host's.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(|offset| SystemClock {
            offset_override: Some(offset),
        })
    }

    /// The override, if one is set.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.offset_override
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.offset_override {
            Some(offset) => business_day(instant, offset),
            None => business_day(instant, Local),
        }
    }

    fn window_of(&self, day: NaiveDate) -> DayWindow {
        match self.offset_override {
            Some(offset) => day_window(day, offset),
            None => day_window(day, Local),
        }
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        FixedClock {
            now: Mutex::new(now),
            offset,
        }
    }

    /// A clock pinned to `now` with a UTC calendar.
    pub fn utc(now: DateTime<Utc>) -> Self {
        FixedClock::new(now, Utc.fix())
    }

    /// Moves the clock forward (or backward, with a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        business_day(instant, self.offset)
    }

    fn window_of(&self, day: NaiveDate) -> DayWindow {
        day_window(day, self.offset)
    }
}
