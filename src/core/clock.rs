//! Clock Seam
//!
//! The ledgers never read system time directly. Everything that depends on
//! "today" or "now" goes through a [`Clock`], so tests can pin the calendar.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};

/// Source of calendar date and wall-clock time.
pub trait Clock {
    /// Current local wall-clock time (store-local timezone).
    fn local_now(&self) -> NaiveDateTime;

    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Current local calendar day.
    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Time left until the next local midnight.
    ///
    /// The default measures naive wall time and ignores DST shifts;
    /// [`SystemClock`] measures against the real timezone.
    fn until_midnight(&self) -> Duration {
        let now = self.local_now();
        let midnight = match now.date().succ_opt() {
            Some(next) => next.and_time(NaiveTime::MIN),
            None => return Duration::ZERO,
        };
        (midnight - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Elapsed time from `now` to the next midnight in its own timezone.
///
/// On a day with a DST shift the result is 23 or 25 hours from the previous
/// midnight. If midnight itself is skipped by the shift, falls back to naive
/// wall time.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let local = now.naive_local();
    let midnight = match local.date().succ_opt() {
        Some(next) => next.and_time(NaiveTime::MIN),
        None => return Duration::ZERO,
    };
    let span = match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(at) => at.signed_duration_since(now.clone()),
        None => midnight - local,
    };
    span.to_std().unwrap_or(Duration::ZERO)
}

impl<C: Clock + ?Sized> Clock for &C {
    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }

    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn until_midnight(&self) -> Duration {
        (**self).until_midnight()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }

    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn until_midnight(&self) -> Duration {
        (**self).until_midnight()
    }
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn until_midnight(&self) -> Duration {
        until_next_midnight(&Local::now())
    }
}

/// Settable clock for tests and replays.
///
/// Local time is treated as UTC for `now_ms`, which keeps the two readings
/// consistent without involving a timezone database. There is no DST, so
/// every day is 24 hours long.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Create a clock frozen at `hh:mm:ss` on the given day.
    ///
    /// Returns `None` for an invalid date or time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = date.and_hms_opt(hour, min, sec)?;
        Some(Self::new(time))
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: NaiveDateTime) {
        *self.lock() = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.lock();
        *now += by;
    }

    /// Move the clock to the same time of day on the following day.
    pub fn next_day(&self) {
        self.advance(TimeDelta::days(1));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned clock still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn local_now(&self) -> NaiveDateTime {
        *self.lock()
    }

    fn now_ms(&self) -> i64 {
        self.lock().and_utc().timestamp_millis()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_today_follows_local_time() {
        let clock = ManualClock::at(2026, 3, 14, 23, 59, 0).unwrap();
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());

        clock.advance(TimeDelta::minutes(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_until_midnight() {
        let clock = ManualClock::at(2026, 3, 14, 22, 30, 0).unwrap();
        assert_eq!(clock.until_midnight(), Duration::from_secs(90 * 60));

        let clock = ManualClock::at(2026, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(clock.until_midnight(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_until_next_midnight_in_timezone() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 3, 14, 22, 30, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(90 * 60));

        let now = tz.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_midnight_within_a_long_day() {
        assert!(SystemClock.until_midnight() <= Duration::from_secs(25 * 3600));
        assert!(Arc::new(SystemClock).until_midnight() <= Duration::from_secs(25 * 3600));
    }

    #[test]
    fn test_now_ms_tracks_advance() {
        let clock = ManualClock::at(2026, 1, 1, 0, 0, 0).unwrap();
        let before = clock.now_ms();
        clock.advance(TimeDelta::milliseconds(1500));
        assert_eq!(clock.now_ms() - before, 1500);
    }

    #[test]
    fn test_shared_clock_sees_updates() {
        let clock = Arc::new(ManualClock::at(2026, 1, 1, 12, 0, 0).unwrap());
        let shared = Arc::clone(&clock);
        clock.next_day();
        assert_eq!(shared.today(), NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }
}
