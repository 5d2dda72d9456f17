//! Block conditions of a set at an instant

use blockwarden_api::BlockMode;
use blockwarden_config::BlockSetConfig;
use blockwarden_store::UsageRecord;
use blockwarden_util::{LocalTime, MinutePeriod};

use crate::windows::{containing_window_end, period_start, rolling_timeline, secs_until_schedule};

/// Schedule, quota and lockdown state of one set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConditions {
    pub mode: BlockMode,
    pub on_selected_day: bool,
    pub has_schedule: bool,
    pub has_quota: bool,
    /// 0 inside a window, `None` if no window is coming
    pub secs_before_schedule: Option<i64>,
    /// 0 once the quota is used up; `None` without a quota or on unselected days
    pub secs_before_quota: Option<i64>,
    pub lockdown: bool,
}

impl BlockConditions {
    pub fn evaluate(cfg: &BlockSetConfig, usage: &UsageRecord, now: i64, utc_offset_secs: i32) -> Self {
        let local = LocalTime::at(now, utc_offset_secs);
        let on_selected_day = cfg.days.contains(local.weekday);

        let windows = cfg.windows();
        let secs_before_schedule = if cfg.has_schedule() {
            secs_until_schedule(&windows, cfg.days, &local)
        } else {
            None
        };

        let quota = cfg.quota();
        let secs_before_quota = match quota {
            Some(q) if on_selected_day => {
                let ps = period_start(now, q.period_secs, utc_offset_secs);
                if usage.window_anchor == ps {
                    Some((q.limit_secs - usage.window_seconds).max(0))
                } else {
                    Some(q.limit_secs)
                }
            }
            _ => None,
        };

        Self {
            mode: cfg.mode,
            on_selected_day,
            has_schedule: cfg.has_schedule(),
            has_quota: quota.is_some(),
            secs_before_schedule,
            secs_before_quota,
            lockdown: usage.in_lockdown(now),
        }
    }

    pub fn within_schedule(&self) -> bool {
        self.secs_before_schedule == Some(0)
    }

    pub fn quota_exhausted(&self) -> bool {
        self.secs_before_quota == Some(0)
    }

    /// Schedule and quota contributions for AND mode; a restriction that is
    /// not configured counts as met on selected days.
    fn conjunct_parts(&self) -> (Option<i64>, Option<i64>) {
        let vacuous = if self.on_selected_day { Some(0) } else { None };
        let schedule = if self.has_schedule { self.secs_before_schedule } else { vacuous };
        let quota = if self.has_quota { self.secs_before_quota } else { vacuous };
        (schedule, quota)
    }

    /// Schedule/quota block condition, ignoring keywords and lockdown
    pub fn conditions_hold(&self) -> bool {
        match self.mode {
            BlockMode::Or => self.within_schedule() || self.quota_exhausted(),
            BlockMode::And => {
                (self.has_schedule || self.has_quota)
                    && self.conjunct_parts() == (Some(0), Some(0))
            }
        }
    }

    /// Whether a page matching the set is blocked, given the keyword outcome
    pub fn should_block(&self, keywords: impl FnOnce() -> bool) -> bool {
        self.lockdown || (self.conditions_hold() && keywords())
    }

    /// Seconds before the set would block: OR takes the earlier of schedule
    /// and quota, AND takes their sum. `None` is never.
    pub fn secs_left(&self) -> Option<i64> {
        match self.mode {
            BlockMode::Or => match (self.secs_before_schedule, self.secs_before_quota) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            BlockMode::And => {
                if !self.has_schedule && !self.has_quota {
                    return None;
                }
                match self.conjunct_parts() {
                    (Some(a), Some(b)) => Some(a + b),
                    _ => None,
                }
            }
        }
    }
}

/// Instant at which a set will next be unblocked, if it can be estimated
pub fn next_unblock_instant(
    cfg: &BlockSetConfig,
    usage: &UsageRecord,
    now: i64,
    utc_offset_secs: i32,
) -> Option<i64> {
    if cfg.is_always_blocked() {
        return None;
    }
    if usage.in_lockdown(now) {
        return Some(usage.lockdown_until);
    }

    let local = LocalTime::at(now, utc_offset_secs);
    let midnight = now - local.seconds_since_midnight();
    let windows: Vec<MinutePeriod> = cfg.windows();
    let timeline = rolling_timeline(&windows, cfg.days, local.day_index());
    let window_end = |minute: i64| containing_window_end(&timeline, minute).map(|end| midnight + end * 60);
    let mins = local.minute_of_day as i64;

    let quota_deadline = cfg.quota().map(|q| {
        let anchor = if usage.window_anchor > 0 {
            usage.window_anchor
        } else {
            period_start(now, q.period_secs, utc_offset_secs)
        };
        anchor.saturating_add(q.period_secs)
    });

    match (cfg.has_schedule(), quota_deadline) {
        (true, None) => window_end(mins),
        (false, Some(deadline)) => Some(deadline),
        (true, Some(deadline)) => match cfg.mode {
            BlockMode::And => window_end(mins).map(|end| end.min(deadline)),
            BlockMode::Or => {
                let conditions = BlockConditions::evaluate(cfg, usage, now, utc_offset_secs);
                if conditions.quota_exhausted() {
                    let minute = (deadline - midnight).div_euclid(60);
                    Some(window_end(minute).unwrap_or(deadline))
                } else {
                    window_end(mins)
                }
            }
        },
        (false, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwarden_util::{DaysOfWeek, SetId};

    // 2024-01-01 00:00:00 UTC, a Monday
    const MONDAY: i64 = 1_704_067_200;

    fn cfg() -> BlockSetConfig {
        let mut cfg = BlockSetConfig::new(SetId::new(1).unwrap());
        cfg.sites = "example.com".into();
        cfg
    }

    fn usage() -> UsageRecord {
        UsageRecord::fresh(MONDAY - 86400)
    }

    fn hm(h: i64, m: i64) -> i64 {
        MONDAY + h * 3600 + m * 60
    }

    #[test]
    fn or_schedule_only() {
        let mut c = cfg();
        c.times = "0900-1700".into();

        let at_ten = BlockConditions::evaluate(&c, &usage(), hm(10, 0), 0);
        assert!(at_ten.within_schedule());
        assert!(at_ten.should_block(|| true));
        assert_eq!(at_ten.secs_left(), Some(0));

        let evening = BlockConditions::evaluate(&c, &usage(), hm(20, 0), 0);
        assert!(!evening.should_block(|| true));
        assert_eq!(evening.secs_left(), Some(13 * 3600));
    }

    #[test]
    fn keywords_gate_schedule_but_not_lockdown() {
        let mut c = cfg();
        c.times = "0000-2400".into();
        let cond = BlockConditions::evaluate(&c, &usage(), hm(10, 0), 0);
        assert!(!cond.should_block(|| false));

        let mut u = usage();
        u.lockdown_until = hm(11, 0);
        let cond = BlockConditions::evaluate(&cfg(), &u, hm(10, 0), 0);
        assert!(cond.should_block(|| false));
        assert!(!cond.conditions_hold());
    }

    #[test]
    fn unblock_time_with_overlapping_windows() {
        let mut c = cfg();
        c.times = "0900-1700,1000-1100".into();
        let cond = BlockConditions::evaluate(&c, &usage(), hm(12, 0), 0);
        assert!(cond.within_schedule());
        assert_eq!(next_unblock_instant(&c, &usage(), hm(12, 0), 0), Some(hm(17, 0)));

        c.times = "1200-1300,0900-1000".into();
        assert_eq!(next_unblock_instant(&c, &usage(), hm(12, 30), 0), Some(hm(13, 0)));
    }

    #[test]
    fn huge_limit_does_not_overflow() {
        let mut c = cfg();
        c.limit_mins = Some(999_999_999_999_999_999);
        c.limit_period = Some(3600);

        let cond = BlockConditions::evaluate(&c, &usage(), hm(10, 0), 0);
        assert!(!cond.has_quota);
        assert!(!cond.should_block(|| true));

        c.limit_mins = Some(10);
        c.limit_period = Some(i64::MAX);
        let mut u = usage();
        u.window_anchor = hm(10, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 0), 0), Some(i64::MAX));
    }

    #[test]
    fn or_quota_counts_current_window_only() {
        let mut c = cfg();
        c.limit_mins = Some(10);
        c.limit_period = Some(3600);

        let mut u = usage();
        u.window_anchor = hm(10, 0);
        u.window_seconds = 400;

        let cond = BlockConditions::evaluate(&c, &u, hm(10, 30), 0);
        assert_eq!(cond.secs_before_quota, Some(200));
        assert!(!cond.quota_exhausted());

        u.window_seconds = 700;
        let cond = BlockConditions::evaluate(&c, &u, hm(10, 30), 0);
        assert!(cond.quota_exhausted());
        assert!(cond.should_block(|| true));

        // Next hour: the stored window is stale
        let cond = BlockConditions::evaluate(&c, &u, hm(11, 0), 0);
        assert_eq!(cond.secs_before_quota, Some(600));
    }

    #[test]
    fn quota_ignored_on_unselected_days() {
        let mut c = cfg();
        c.limit_mins = Some(10);
        c.limit_period = Some(86400);
        c.days = DaysOfWeek::WEEKENDS;
        let cond = BlockConditions::evaluate(&c, &usage(), hm(10, 0), 0);
        assert!(!cond.on_selected_day);
        assert_eq!(cond.secs_before_quota, None);
        assert_eq!(cond.secs_left(), None);
    }

    #[test]
    fn and_mode_needs_both() {
        let mut c = cfg();
        c.mode = BlockMode::And;
        c.times = "0900-1700".into();
        c.limit_mins = Some(30);
        c.limit_period = Some(86400);

        let mut u = usage();
        u.window_anchor = MONDAY;
        u.window_seconds = 600;

        let cond = BlockConditions::evaluate(&c, &u, hm(10, 0), 0);
        assert!(cond.within_schedule());
        assert!(!cond.conditions_hold());
        // Sum of both parts
        assert_eq!(cond.secs_left(), Some(1200));

        u.window_seconds = 1800;
        let cond = BlockConditions::evaluate(&c, &u, hm(10, 0), 0);
        assert!(cond.conditions_hold());
        assert_eq!(cond.secs_left(), Some(0));

        let cond = BlockConditions::evaluate(&c, &u, hm(18, 0), 0);
        assert!(!cond.conditions_hold());
    }

    #[test]
    fn and_mode_missing_restriction_is_met() {
        let mut c = cfg();
        c.mode = BlockMode::And;
        c.limit_mins = Some(60);
        c.limit_period = Some(3600);

        let mut u = usage();
        u.window_anchor = hm(10, 0);
        u.window_seconds = 3660;
        let cond = BlockConditions::evaluate(&c, &u, hm(10, 59), 0);
        assert!(cond.conditions_hold());

        let cond = BlockConditions::evaluate(&c, &u, hm(11, 0), 0);
        assert!(!cond.conditions_hold());
        assert_eq!(cond.secs_left(), Some(3600));

        // Neither restriction: never blocks
        let mut c = cfg();
        c.mode = BlockMode::And;
        let cond = BlockConditions::evaluate(&c, &usage(), hm(10, 0), 0);
        assert!(!cond.conditions_hold());
        assert_eq!(cond.secs_left(), None);
    }

    #[test]
    fn unblock_schedule_only() {
        let mut c = cfg();
        c.times = "0900-1700".into();
        assert_eq!(next_unblock_instant(&c, &usage(), hm(10, 0), 0), Some(hm(17, 0)));
        assert_eq!(next_unblock_instant(&c, &usage(), hm(18, 0), 0), None);

        c.times = "0900-1700,1700-1900".into();
        assert_eq!(next_unblock_instant(&c, &usage(), hm(10, 0), 0), Some(hm(19, 0)));
    }

    #[test]
    fn unblock_schedule_uses_local_midnight() {
        let mut c = cfg();
        c.times = "0900-1700".into();
        // UTC+2: 10:00 local is 08:00 UTC, 17:00 local is 15:00 UTC
        assert_eq!(
            next_unblock_instant(&c, &usage(), hm(8, 0), 7200),
            Some(hm(15, 0))
        );
    }

    #[test]
    fn unblock_quota_only() {
        let mut c = cfg();
        c.limit_mins = Some(10);
        c.limit_period = Some(3600);
        let mut u = usage();
        u.window_anchor = hm(10, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 30), 0), Some(hm(11, 0)));

        u.window_anchor = 0;
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 30), 0), Some(hm(11, 0)));
    }

    #[test]
    fn unblock_and_takes_earlier() {
        let mut c = cfg();
        c.mode = BlockMode::And;
        c.times = "0900-1700".into();
        c.limit_mins = Some(10);
        c.limit_period = Some(3600);
        let mut u = usage();
        u.window_anchor = hm(10, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 30), 0), Some(hm(11, 0)));

        u.window_anchor = hm(16, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(16, 30), 0), Some(hm(17, 0)));
    }

    #[test]
    fn unblock_or_projects_exhausted_quota() {
        let mut c = cfg();
        c.times = "1000-1030".into();
        c.limit_mins = Some(10);
        c.limit_period = Some(3600);

        // Quota used up at 09:50; its period ends at 10:00, inside the window
        let mut u = usage();
        u.window_anchor = hm(9, 0);
        u.window_seconds = 600;
        assert_eq!(next_unblock_instant(&c, &u, hm(9, 50), 0), Some(hm(10, 30)));

        // Quota used up at 11:15: period ends at 12:00, outside any window
        u.window_anchor = hm(11, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(11, 15), 0), Some(hm(12, 0)));

        // Quota not used up, inside the window
        u.window_seconds = 0;
        u.window_anchor = hm(10, 0);
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 10), 0), Some(hm(10, 30)));
    }

    #[test]
    fn unblock_lockdown_and_permanent() {
        let mut u = usage();
        u.lockdown_until = hm(12, 0);
        assert_eq!(next_unblock_instant(&cfg(), &u, hm(10, 0), 0), Some(hm(12, 0)));

        let mut c = cfg();
        c.times = "0000-2400".into();
        assert_eq!(next_unblock_instant(&c, &u, hm(10, 0), 0), None);

        assert_eq!(next_unblock_instant(&cfg(), &usage(), hm(10, 0), 0), None);
    }
}
