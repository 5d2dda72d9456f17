//! Time utilities for blockwarden
//!
//! Instants are whole seconds since the Unix epoch (`i64`). Local wall-clock
//! breakdowns are computed from an instant plus an explicit UTC offset so
//! callers can pin the offset in tests instead of depending on the machine's
//! time zone.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `BLOCKWARDEN_MOCK_TIME` environment variable can be
//! set to override the system time for all time-sensitive operations. The
//! mocked clock advances at the real rate from the given starting point.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! BLOCKWARDEN_MOCK_TIME="2025-12-25 14:30:00" blockwarden check https://example.com
//! ```

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Offset, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "BLOCKWARDEN_MOCK_TIME";

pub const SECS_PER_MINUTE: i64 = 60;
pub const SECS_PER_HOUR: i64 = 3600;
pub const SECS_PER_DAY: i64 = 86400;
pub const MINUTES_PER_DAY: u32 = 1440;

/// Offset between mock time and real time, computed once per process.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // The wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Current instant in seconds since the epoch.
pub fn unix_now() -> i64 {
    now().timestamp()
}

/// Offset of local time from UTC at `instant`, in seconds (east positive).
pub fn local_offset_secs(instant: i64) -> i32 {
    match Local.timestamp_opt(instant, 0) {
        chrono::LocalResult::Single(dt) => dt.offset().fix().local_minus_utc(),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.offset().fix().local_minus_utc(),
        chrono::LocalResult::None => 0,
    }
}

/// Render an instant as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_instant(instant: i64) -> String {
    match Local.timestamp_opt(instant, 0).earliest() {
        Some(dt) => format_datetime_full(&dt),
        None => instant.to_string(),
    }
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a second count as `HH:MM:SS`, with a leading `-` when negative.
///
/// Hours are not wrapped at 24.
pub fn format_hms(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    let h = secs / 3600;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{sign}{h:02}:{m:02}:{s:02}")
}

/// Wall-clock breakdown of an instant at a given UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub weekday: Weekday,
    /// Minutes since local midnight (0..1440)
    pub minute_of_day: u32,
    /// Seconds within the current minute
    pub second: u32,
}

impl LocalTime {
    pub fn at(instant: i64, offset_secs: i32) -> Self {
        let local = DateTime::from_timestamp(instant + offset_secs as i64, 0)
            .unwrap_or_default()
            .naive_utc();
        Self {
            weekday: local.weekday(),
            minute_of_day: local.hour() * 60 + local.minute(),
            second: local.second(),
        }
    }

    pub fn seconds_since_midnight(&self) -> i64 {
        self.minute_of_day as i64 * 60 + self.second as i64
    }

    /// Day of week counted from Sunday (0..7)
    pub fn day_index(&self) -> u32 {
        self.weekday.num_days_from_sunday()
    }
}

/// Days of the week bitmask.
///
/// Bit 0 is Sunday and bit 6 is Saturday, matching the persisted `days`
/// preference encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    pub const SUNDAY: u8 = 1 << 0;
    pub const MONDAY: u8 = 1 << 1;
    pub const TUESDAY: u8 = 1 << 2;
    pub const WEDNESDAY: u8 = 1 << 3;
    pub const THURSDAY: u8 = 1 << 4;
    pub const FRIDAY: u8 = 1 << 5;
    pub const SATURDAY: u8 = 1 << 6;

    pub const WEEKDAYS: DaysOfWeek = DaysOfWeek(
        Self::MONDAY | Self::TUESDAY | Self::WEDNESDAY | Self::THURSDAY | Self::FRIDAY,
    );
    pub const WEEKENDS: DaysOfWeek = DaysOfWeek(Self::SATURDAY | Self::SUNDAY);
    pub const ALL_DAYS: DaysOfWeek = DaysOfWeek(0x7F);
    pub const NONE: DaysOfWeek = DaysOfWeek(0);

    pub fn new(mask: u8) -> Self {
        Self(mask & 0x7F)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.contains_index(weekday.num_days_from_sunday())
    }

    /// Check by day index counted from Sunday; wraps modulo 7
    pub fn contains_index(&self, day: u32) -> bool {
        (self.0 >> (day % 7)) & 1 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_all(&self) -> bool {
        self.0 == 0x7F
    }
}

impl Default for DaysOfWeek {
    fn default() -> Self {
        Self::ALL_DAYS
    }
}

impl std::ops::BitOr for DaysOfWeek {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// A daily interval `[start, end)` in minutes since local midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutePeriod {
    pub start: u32,
    pub end: u32,
}

impl MinutePeriod {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, minute: u32) -> bool {
        minute >= self.start && minute < self.end
    }

    pub fn is_all_day(&self) -> bool {
        self.start == 0 && self.end == MINUTES_PER_DAY
    }
}

/// Parse a list of `HHMM-HHMM` tokens separated by commas and/or spaces.
///
/// Malformed tokens are skipped. Input order is preserved.
pub fn parse_windows(text: &str) -> Vec<MinutePeriod> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(parse_window_token)
        .collect()
}

fn parse_window_token(token: &str) -> Option<MinutePeriod> {
    let (start, end) = token.split_once('-')?;
    Some(MinutePeriod::new(parse_hhmm(start)?, parse_hhmm(end)?))
}

fn parse_hhmm(s: &str) -> Option<u32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = s[..2].parse().ok()?;
    let minutes: u32 = s[2..].parse().ok()?;
    Some(hours * 60 + minutes)
}
