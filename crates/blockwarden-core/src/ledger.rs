//! Usage ledger
//!
//! Read-modify-write access to the per-set usage records. Each set has its own
//! lock so concurrent accumulation for the same set is serialized while
//! different sets proceed independently.

use blockwarden_api::{BlockMode, SetStats};
use blockwarden_config::BlockSetConfig;
use blockwarden_store::{load_usage, save_usage, PrefStore, StoreError, StoreResult, UsageRecord};
use blockwarden_util::{LocalTime, SetId, SECS_PER_DAY};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::windows::{period_start, within_schedule};

pub struct UsageLedger {
    prefs: Arc<dyn PrefStore>,
    locks: [Mutex<()>; SetId::COUNT],
}

impl UsageLedger {
    pub fn new(prefs: Arc<dyn PrefStore>) -> Self {
        Self {
            prefs,
            locks: Default::default(),
        }
    }

    fn lock(&self, set: SetId) -> StoreResult<MutexGuard<'_, ()>> {
        self.locks[set.index()]
            .lock()
            .map_err(|_| StoreError::Database(format!("usage lock for set {set} poisoned")))
    }

    /// Current record of a set; unreadable records are fresh
    pub fn load(&self, set: SetId, now: i64) -> UsageRecord {
        load_usage(self.prefs.as_ref(), set, now).unwrap_or_else(|e| {
            warn!(set = %set, error = %e, "Failed to read usage record");
            UsageRecord::fresh(now)
        })
    }

    fn update(
        &self,
        set: SetId,
        now: i64,
        f: impl FnOnce(&mut UsageRecord),
    ) -> StoreResult<UsageRecord> {
        let _guard = self.lock(set)?;
        let mut record = load_usage(self.prefs.as_ref(), set, now)?;
        f(&mut record);
        save_usage(self.prefs.as_ref(), set, &record)?;
        Ok(record)
    }

    /// Add time spent on a page matching the set.
    ///
    /// The lifetime total always grows. Window time grows only on selected
    /// days, and in AND mode only inside the schedule (or when there is
    /// none). A new quota period restarts the window count.
    pub fn accumulate(
        &self,
        cfg: &BlockSetConfig,
        now: i64,
        utc_offset_secs: i32,
        secs_open: i64,
        secs_focus: i64,
    ) -> StoreResult<UsageRecord> {
        let seconds = if cfg.count_focus { secs_focus } else { secs_open };
        let local = LocalTime::at(now, utc_offset_secs);

        let mut counts = cfg.days.contains(local.weekday);
        if counts && cfg.mode == BlockMode::And && cfg.has_schedule() {
            counts = within_schedule(&cfg.windows(), cfg.days, &local);
        }
        let ps = period_start(now, cfg.limit_period.unwrap_or(0), utc_offset_secs);

        let set = cfg.set;
        self.update(set, now, |record| {
            record.total_seconds += seconds;

            if counts && ps > 0 && record.window_anchor >= 0 {
                if record.window_anchor != ps {
                    info!(set = %set, period_start = ps, "New quota period");
                    record.window_anchor = ps;
                    record.window_seconds = seconds;
                } else {
                    record.window_seconds += seconds;
                }
            }
            debug!(
                set = %set,
                seconds,
                total = record.total_seconds,
                window = record.window_seconds,
                "Usage accumulated"
            );
        })
    }

    /// Restart data gathering: new period anchor, zero total
    pub fn restart(&self, set: SetId, now: i64) -> StoreResult<UsageRecord> {
        self.update(set, now, |record| {
            record.period_anchor = now;
            record.total_seconds = 0;
        })
    }

    pub fn set_lockdown(&self, set: SetId, until: i64, now: i64) -> StoreResult<UsageRecord> {
        self.update(set, now, |record| record.lockdown_until = until)
    }

    pub fn clear_lockdown(&self, set: SetId, now: i64) -> StoreResult<UsageRecord> {
        self.set_lockdown(set, 0, now)
    }

    /// Latest lockdown deadline across all sets, if one is active
    pub fn active_lockdown(&self, now: i64) -> Option<i64> {
        SetId::all()
            .map(|set| self.load(set, now).lockdown_until)
            .filter(|until| *until > now)
            .max()
    }
}

/// Usage statistics of a set
pub fn usage_stats(cfg: &BlockSetConfig, record: &UsageRecord, now: i64, utc_offset_secs: i32) -> SetStats {
    let days = 1 + now.div_euclid(SECS_PER_DAY) - record.period_anchor.div_euclid(SECS_PER_DAY);
    let quota_left_secs = cfg.quota().map(|q| {
        if record.window_anchor == period_start(now, q.period_secs, utc_offset_secs) {
            (q.limit_secs - record.window_seconds).max(0)
        } else {
            q.limit_secs
        }
    });

    SetStats {
        set: cfg.set,
        started_at: record.period_anchor,
        total_secs: record.total_seconds,
        avg_secs_per_day: record.total_seconds as f64 / days.max(1) as f64,
        quota_left_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwarden_store::SqliteStore;
    use blockwarden_util::DaysOfWeek;

    // 2024-01-01 00:00:00 UTC, a Monday
    const MONDAY: i64 = 1_704_067_200;

    fn set(n: u8) -> SetId {
        SetId::new(n).unwrap()
    }

    fn ledger() -> UsageLedger {
        UsageLedger::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn hourly(n: u8) -> BlockSetConfig {
        let mut cfg = BlockSetConfig::new(set(n));
        cfg.sites = "example.com".into();
        cfg.limit_mins = Some(60);
        cfg.limit_period = Some(3600);
        cfg
    }

    #[test]
    fn accumulate_within_period() {
        let ledger = ledger();
        let cfg = hourly(1);
        let now = MONDAY + 10 * 3600 + 60;

        let rec = ledger.accumulate(&cfg, now, 0, 30, 0).unwrap();
        assert_eq!(rec.window_anchor, MONDAY + 10 * 3600);
        assert_eq!(rec.window_seconds, 30);
        assert_eq!(rec.total_seconds, 30);

        let rec = ledger.accumulate(&cfg, now + 100, 0, 45, 0).unwrap();
        assert_eq!(rec.window_seconds, 75);
        assert_eq!(rec.total_seconds, 75);
    }

    #[test]
    fn rollover_resets_window() {
        let ledger = ledger();
        let cfg = hourly(1);
        ledger.accumulate(&cfg, MONDAY + 10 * 3600 + 60, 0, 3000, 0).unwrap();

        let rec = ledger.accumulate(&cfg, MONDAY + 11 * 3600 + 5, 0, 20, 0).unwrap();
        assert_eq!(rec.window_anchor, MONDAY + 11 * 3600);
        assert_eq!(rec.window_seconds, 20);
        assert_eq!(rec.total_seconds, 3020);
    }

    #[test]
    fn focus_time_when_configured() {
        let ledger = ledger();
        let mut cfg = hourly(2);
        cfg.count_focus = true;
        let rec = ledger.accumulate(&cfg, MONDAY + 60, 0, 100, 40).unwrap();
        assert_eq!(rec.total_seconds, 40);
    }

    #[test]
    fn window_not_counted_on_unselected_day() {
        let ledger = ledger();
        let mut cfg = hourly(1);
        cfg.days = DaysOfWeek::WEEKENDS;
        let rec = ledger.accumulate(&cfg, MONDAY + 60, 0, 100, 0).unwrap();
        assert_eq!(rec.total_seconds, 100);
        assert_eq!(rec.window_seconds, 0);
        assert_eq!(rec.window_anchor, 0);
    }

    #[test]
    fn and_mode_counts_inside_schedule_only() {
        let ledger = ledger();
        let mut cfg = hourly(1);
        cfg.mode = BlockMode::And;
        cfg.times = "0900-1700".into();

        let rec = ledger.accumulate(&cfg, MONDAY + 8 * 3600, 0, 100, 0).unwrap();
        assert_eq!(rec.window_seconds, 0);
        let rec = ledger.accumulate(&cfg, MONDAY + 9 * 3600, 0, 100, 0).unwrap();
        assert_eq!(rec.window_seconds, 100);
        assert_eq!(rec.total_seconds, 200);

        // No schedule: counted on any selected day
        cfg.times.clear();
        let rec = ledger.accumulate(&cfg, MONDAY + 9 * 3600 + 10, 0, 50, 0).unwrap();
        assert_eq!(rec.window_seconds, 150);
    }

    #[test]
    fn no_quota_no_window() {
        let ledger = ledger();
        let mut cfg = hourly(1);
        cfg.limit_period = None;
        let rec = ledger.accumulate(&cfg, MONDAY, 0, 100, 0).unwrap();
        assert_eq!(rec.window_anchor, 0);
        assert_eq!(rec.total_seconds, 100);
    }

    #[test]
    fn restart_keeps_window_and_lockdown() {
        let ledger = ledger();
        let cfg = hourly(1);
        ledger.accumulate(&cfg, MONDAY + 60, 0, 100, 0).unwrap();
        ledger.set_lockdown(set(1), MONDAY + 7200, MONDAY + 60).unwrap();

        let rec = ledger.restart(set(1), MONDAY + 120).unwrap();
        assert_eq!(rec.period_anchor, MONDAY + 120);
        assert_eq!(rec.total_seconds, 0);
        assert_eq!(rec.window_seconds, 100);
        assert_eq!(rec.lockdown_until, MONDAY + 7200);

        assert_eq!(ledger.active_lockdown(MONDAY + 120), Some(MONDAY + 7200));
        ledger.clear_lockdown(set(1), MONDAY + 130).unwrap();
        assert_eq!(ledger.active_lockdown(MONDAY + 130), None);
    }

    #[test]
    fn concurrent_accumulation_is_serialized() {
        let ledger = Arc::new(ledger());
        let cfg = hourly(3);
        let now = MONDAY + 60;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let cfg = cfg.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        ledger.accumulate(&cfg, now, 0, 1, 0).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let rec = ledger.load(set(3), now);
        assert_eq!(rec.total_seconds, 200);
        assert_eq!(rec.window_seconds, 200);
    }

    #[test]
    fn stats() {
        let cfg = hourly(1);
        let record = UsageRecord {
            period_anchor: MONDAY - 2 * SECS_PER_DAY,
            total_seconds: 9000,
            window_anchor: MONDAY + 3600,
            window_seconds: 1200,
            lockdown_until: 0,
        };

        let stats = usage_stats(&cfg, &record, MONDAY + 3600 + 10, 0);
        assert_eq!(stats.total_secs, 9000);
        assert_eq!(stats.avg_secs_per_day, 3000.0);
        assert_eq!(stats.quota_left_secs, Some(2400));

        let stats = usage_stats(&cfg, &record, MONDAY + 7200, 0);
        assert_eq!(stats.quota_left_secs, Some(3600));

        let no_quota = BlockSetConfig::new(set(1));
        assert_eq!(usage_stats(&no_quota, &record, MONDAY, 0).quota_left_secs, None);
    }
}
