//! Time and timestamp helpers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used for snapshots, activation times, and notifications.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Shift a timestamp by a [`Duration`], saturating at the far future.
#[must_use]
pub fn add_duration(ts: Timestamp, delay: Duration) -> Timestamp {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| ts.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time of day, written `HH:MM` or `HH:MM:SS` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Build a clock time from hour, minute, and second.
    #[must_use]
    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, min, sec).map(Self)
    }

    /// Time remaining from `now` until the next occurrence of this clock time.
    ///
    /// Today's occurrence is used if it lies strictly in the future, otherwise
    /// tomorrow's. Occurrences are read on the wall clock of `now`'s zone and
    /// measured in elapsed time, so a DST change in between is accounted for.
    /// A time repeated when clocks go back counts at its first occurrence; a
    /// time skipped when they go forward is taken one hour later.
    #[must_use]
    pub fn until_next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        let tz = now.timezone();
        let mut date = now.date_naive();
        // Two days always suffice; the third covers a skipped occurrence.
        for _ in 0..3 {
            if let Some(next) = resolve_local(&tz, date.and_time(self.0))
                && next > *now
            {
                return next
                    .signed_duration_since(now.clone())
                    .to_std()
                    .unwrap_or_default();
            }
            match date.succ_opt() {
                Some(following) => date = following,
                None => break,
            }
        }
        Duration::ZERO
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local).earliest().or_else(|| {
        tz.from_local_datetime(&(local + chrono::Duration::hours(1)))
            .earliest()
    })
}

impl std::str::FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidClockTime(s.to_string()))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Render a delay the way operators read it (`2h`, `1h30m`, `45s`).
#[must_use]
pub fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, h, m, s).unwrap()
    }

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_parse_hour_and_minute() {
        let t: ClockTime = "23:30".parse().unwrap();
        assert_eq!(t, ClockTime::from_hms(23, 30, 0).unwrap());
    }

    #[test]
    fn should_parse_seconds_when_present() {
        let t: ClockTime = "01:02:03".parse().unwrap();
        assert_eq!(t.to_string(), "01:02:03");
    }

    #[test]
    fn should_reject_malformed_clock_time() {
        let err = "25:00".parse::<ClockTime>().unwrap_err();
        assert_eq!(err, ValidationError::InvalidClockTime("25:00".to_string()));
        assert!("noon".parse::<ClockTime>().is_err());
    }

    #[test]
    fn should_wait_until_later_today_when_time_not_passed() {
        let t = ClockTime::from_hms(23, 30, 0).unwrap();
        assert_eq!(t.until_next(&at(22, 0, 0)), Duration::from_secs(90 * 60));
    }

    #[test]
    fn should_wait_until_tomorrow_when_time_already_passed() {
        let t = ClockTime::from_hms(6, 0, 0).unwrap();
        assert_eq!(t.until_next(&at(7, 0, 0)), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn should_wait_a_full_day_when_time_is_now() {
        let t = ClockTime::from_hms(12, 0, 0).unwrap();
        assert_eq!(t.until_next(&at(12, 0, 0)), Duration::from_secs(24 * 3600));
    }

    /// Central European time around the 2026 spring change: clocks jump
    /// from 02:00 (+01:00) to 03:00 (+02:00) on March 29th.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        const WINTER: i32 = 3600;
        const SUMMER: i32 = 7200;

        fn change_utc() -> NaiveDateTime {
            chrono::NaiveDate::from_ymd_opt(2026, 3, 29)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        }

        fn offset(secs: i32) -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(secs).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = chrono::FixedOffset;

        fn from_offset(_offset: &chrono::FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(
            &self,
            local: &chrono::NaiveDate,
        ) -> chrono::LocalResult<chrono::FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> chrono::LocalResult<chrono::FixedOffset> {
            let change = Self::change_utc();
            let winter_end = change + chrono::Duration::seconds(i64::from(Self::WINTER));
            let summer_start = change + chrono::Duration::seconds(i64::from(Self::SUMMER));
            if *local < winter_end {
                chrono::LocalResult::Single(Self::offset(Self::WINTER))
            } else if *local >= summer_start {
                chrono::LocalResult::Single(Self::offset(Self::SUMMER))
            } else {
                chrono::LocalResult::None
            }
        }

        fn offset_from_utc_date(&self, utc: &chrono::NaiveDate) -> chrono::FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> chrono::FixedOffset {
            if *utc < Self::change_utc() {
                Self::offset(Self::WINTER)
            } else {
                Self::offset(Self::SUMMER)
            }
        }
    }

    fn local(day: u32, h: u32, m: u32) -> DateTime<SpringForward> {
        SpringForward
            .with_ymd_and_hms(2026, 3, day, h, m, 0)
            .unwrap()
    }

    #[test]
    fn should_count_elapsed_time_when_clocks_go_forward_before_target() {
        let t = ClockTime::from_hms(23, 30, 0).unwrap();
        let now = local(28, 23, 45);

        let delay = t.until_next(&now);

        // 23:30 on the 29th is already summer time, one hour less to wait.
        assert_eq!(delay, Duration::from_secs(22 * 3600 + 45 * 60));
        let fires_at = now.with_timezone(&Utc) + chrono::Duration::from_std(delay).unwrap();
        assert_eq!(fires_at, Utc.with_ymd_and_hms(2026, 3, 29, 21, 30, 0).unwrap());
    }

    #[test]
    fn should_shift_target_by_an_hour_when_it_falls_in_skipped_time() {
        let t = ClockTime::from_hms(2, 30, 0).unwrap();

        let delay = t.until_next(&local(29, 0, 0));

        // 02:30 does not exist that night; 03:30 summer time is 01:30 UTC.
        assert_eq!(delay, Duration::from_secs(2 * 3600 + 30 * 60));
    }

    #[test]
    fn should_roundtrip_clock_time_through_serde_as_string() {
        let t = ClockTime::from_hms(23, 15, 0).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"23:15:00\"");
        let parsed: ClockTime = serde_json::from_str("\"23:15\"").unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn should_format_delay_compactly() {
        assert_eq!(format_delay(Duration::from_secs(7200)), "2h");
        assert_eq!(format_delay(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_delay(Duration::from_secs(45)), "45s");
        assert_eq!(format_delay(Duration::ZERO), "0s");
    }
}
