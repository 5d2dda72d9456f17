//! Time window model
//!
//! Schedules are daily minute periods on selected days of the week. Quota
//! periods are counted from [`period_start`], which aligns periods longer
//! than an hour to local midnight and periods longer than a day to Sunday.

use blockwarden_util::{DaysOfWeek, LocalTime, MinutePeriod, MINUTES_PER_DAY, SECS_PER_DAY, SECS_PER_HOUR};

/// Days scanned ahead when looking for the next schedule window
const LOOK_AHEAD_DAYS: u32 = 7;

/// Start of the quota period containing `now`, or 0 when `period <= 0`.
///
/// `utc_offset_secs` is the local offset at `now`, east positive.
pub fn period_start(now: i64, period: i64, utc_offset_secs: i32) -> i64 {
    if period <= 0 {
        return 0;
    }

    let mut start = now - now.rem_euclid(period);
    if period > SECS_PER_HOUR {
        start -= utc_offset_secs as i64;
        if period > SECS_PER_DAY {
            // The epoch fell on a Thursday; move back to Sunday
            start -= 4 * SECS_PER_DAY;
        }

        while start > now {
            start -= period;
        }
        while start <= now - period {
            start += period;
        }
    }
    start
}

/// Whether `local` falls inside one of the windows on a selected day
pub fn within_schedule(windows: &[MinutePeriod], days: DaysOfWeek, local: &LocalTime) -> bool {
    days.contains(local.weekday) && windows.iter().any(|p| p.contains(local.minute_of_day))
}

/// Seconds until the schedule next applies: 0 inside a window, `None` if no
/// window starts within the next seven days.
pub fn secs_until_schedule(
    windows: &[MinutePeriod],
    days: DaysOfWeek,
    local: &LocalTime,
) -> Option<i64> {
    if within_schedule(windows, days, local) {
        return Some(0);
    }

    let today = local.day_index();
    let mins = local.minute_of_day as i64;
    (0..=LOOK_AHEAD_DAYS)
        .filter(|i| days.contains_index(today + i))
        .flat_map(|i| {
            windows
                .iter()
                .filter(|p| p.start < p.end)
                .map(move |p| i as i64 * MINUTES_PER_DAY as i64 + p.start as i64)
        })
        .filter(|start| *start > mins)
        .map(|start| (start - mins) * 60 - local.second as i64)
        .min()
}

/// Windows of today and the following seven selected days on one rolling
/// minute timeline starting at today's midnight. Touching or overlapping
/// windows are merged.
pub fn rolling_timeline(windows: &[MinutePeriod], days: DaysOfWeek, today: u32) -> Vec<(i64, i64)> {
    let mut sorted: Vec<&MinutePeriod> = windows.iter().filter(|p| p.start < p.end).collect();
    sorted.sort_by_key(|p| (p.start, p.end));

    let mut timeline: Vec<(i64, i64)> = Vec::new();
    for i in 0..=LOOK_AHEAD_DAYS {
        if !days.contains_index(today + i) {
            continue;
        }
        let offset = i as i64 * MINUTES_PER_DAY as i64;
        for p in &sorted {
            let (start, end) = (p.start as i64 + offset, p.end as i64 + offset);
            match timeline.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => timeline.push((start, end)),
            }
        }
    }
    timeline
}

/// End (in timeline minutes) of the timeline window containing `minute`
pub fn containing_window_end(timeline: &[(i64, i64)], minute: i64) -> Option<i64> {
    timeline
        .iter()
        .find(|(start, end)| minute >= *start && minute < *end)
        .map(|(_, end)| *end)
}
