//! Integration tests for blockwarden
//!
//! These tests drive the engine end to end through the public crates: a
//! real SQLite store, the mock browser and a pinned clock.

use blockwarden_api::{EventPayload, TimeLeft, Verdict};
use blockwarden_config::{parse_config, BlockSetConfig, DELAYED_BLOCK_URL};
use blockwarden_core::BlockEngine;
use blockwarden_host_api::{FixedClock, MockBrowser};
use blockwarden_store::{load_usage, save_usage, usage_key, PrefStore, SqliteStore, UsageRecord};
use blockwarden_util::{db_path, DocHandle, SetId};
use std::sync::Arc;

// 2024-01-01 00:00:00 UTC, a Monday
const MONDAY: i64 = 1_704_067_200;
const URL: &str = "http://example.com/";

fn hm(h: i64, m: i64) -> i64 {
    MONDAY + h * 3600 + m * 60
}

fn set(n: u8) -> SetId {
    SetId::new(n).unwrap()
}

fn doc(n: u64) -> DocHandle {
    DocHandle::new(n)
}

struct Browser {
    engine: BlockEngine,
    store: Arc<SqliteStore>,
    browser: Arc<MockBrowser>,
}

impl Browser {
    fn with_store(store: Arc<SqliteStore>) -> Self {
        let browser = Arc::new(MockBrowser::new());
        let clock = Arc::new(FixedClock::new(MONDAY, 0));
        let engine = BlockEngine::new(store.clone(), browser.clone(), clock);
        Self {
            engine,
            store,
            browser,
        }
    }

    fn new() -> Self {
        Self::with_store(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn configure(&self, n: u8, f: impl FnOnce(&mut BlockSetConfig)) {
        let mut cfg = BlockSetConfig::new(set(n));
        cfg.sites = "example.com".into();
        f(&mut cfg);
        cfg.save(self.store.as_ref(), MONDAY).unwrap();
    }

    fn open(&mut self, n: u64, url: &str, now: i64) -> Verdict {
        self.browser.open(doc(n), url);
        self.engine.on_document_opened(doc(n), url, now)
    }

    fn open_with_text(&mut self, n: u64, url: &str, text: &[&str], now: i64) -> Verdict {
        self.browser.open(doc(n), url);
        self.browser.set_text(doc(n), text);
        self.engine.on_document_opened(doc(n), url, now)
    }

    fn usage(&self, n: u8, now: i64) -> UsageRecord {
        load_usage(self.store.as_ref(), set(n), now).unwrap()
    }
}

#[test]
fn test_schedule_blocks_during_working_hours() {
    let mut b = Browser::new();
    b.configure(1, |c| c.times = "0900-1700".into());

    let verdict = b.open(1, URL, hm(10, 0));
    assert_eq!(verdict.blocking_set(), Some(set(1)));
    assert_eq!(
        b.browser.last_navigation(doc(1)).as_deref(),
        Some("blockwarden://blocked?1&http://example.com/")
    );

    // Until 09:00 the next day
    let verdict = b.open(2, URL, hm(20, 0));
    assert_eq!(
        verdict,
        Verdict::Allow {
            time_left: TimeLeft {
                seconds: Some(13 * 3600),
                set: Some(set(1)),
            },
        }
    );
    assert!(b.browser.last_navigation(doc(2)).is_none());
}

#[test]
fn test_hourly_quota_rolls_over() {
    let mut b = Browser::new();
    b.configure(1, |c| {
        c.mode = blockwarden_api::BlockMode::And;
        c.limit_mins = Some(60);
        c.limit_period = Some(3600);
    });
    save_usage(
        b.store.as_ref(),
        set(1),
        &UsageRecord {
            period_anchor: MONDAY,
            total_seconds: 3660,
            window_anchor: hm(10, 0),
            window_seconds: 3660,
            lockdown_until: 0,
        },
    )
    .unwrap();

    assert_eq!(b.open(1, URL, hm(10, 30)).blocking_set(), Some(set(1)));
    assert_eq!(b.engine.unblock_time(set(1), hm(10, 30)), Some(hm(11, 0)));

    let verdict = b.open(2, URL, hm(11, 0));
    assert_eq!(
        verdict,
        Verdict::Allow {
            time_left: TimeLeft {
                seconds: Some(3600),
                set: Some(set(1)),
            },
        }
    );

    b.engine.on_document_closed(doc(2), hm(11, 0) + 90);
    let usage = b.usage(1, hm(11, 0) + 90);
    assert_eq!(usage.window_anchor, hm(11, 0));
    assert_eq!(usage.window_seconds, 90);
    assert_eq!(usage.total_seconds, 3660 + 90);
}

#[test]
fn test_open_page_is_charged_across_the_hour() {
    let mut b = Browser::new();
    b.configure(1, |c| {
        c.limit_mins = Some(60);
        c.limit_period = Some(3600);
    });
    let start = hm(10, 59) + 50;

    assert!(b.open(1, URL, start).is_allow());
    b.engine.on_focus_changed(doc(1), true, start);

    // Re-checks every five seconds clock the time spent so far
    for secs in [5, 10, 15, 20] {
        b.engine.tick(start + secs);
    }

    let usage = b.usage(1, start + 20);
    assert_eq!(usage.window_anchor, hm(11, 0));
    assert_eq!(usage.window_seconds, 15);
    assert_eq!(usage.total_seconds, 20);
}

#[test]
fn test_lockdown_overrides_everything() {
    let mut b = Browser::new();
    b.configure(3, |_| {});
    let now = hm(10, 0);

    assert!(b.open(1, URL, now).is_allow());
    b.engine.take_events();

    let until = b.engine.start_lockdown(&[set(3)], 3600, now).unwrap();
    assert_eq!(until, now + 3600);
    let events = b.engine.take_events();
    assert!(events.iter().any(|e| e.payload
        == EventPayload::LockdownStarted {
            sets: vec![set(3)],
            until,
        }));

    let verdict = b.open(2, "http://example.com/page", now + 60);
    assert_eq!(verdict.blocking_set(), Some(set(3)));
    assert!(b.engine.status(now + 60).sets[2].blocking);

    assert!(b.open(3, "http://example.com/page", now + 3601).is_allow());
}

#[test]
fn test_token_list_with_exception_and_keyword() {
    let mut b = Browser::new();
    b.configure(1, |c| {
        c.sites = "example.com +example.com/safe ~badword".into();
        c.times = "0000-2400".into();
    });
    let now = hm(12, 0);

    assert!(b
        .open_with_text(1, "http://example.com/safe", &["badword"], now)
        .is_allow());
    assert_eq!(
        b.open_with_text(2, "http://example.com/other", &["a badword here"], now)
            .blocking_set(),
        Some(set(1))
    );
    assert!(b
        .open_with_text(3, "http://example.com/other", &["nothing here"], now)
        .is_allow());
    assert!(b.open_with_text(4, "http://example.org/", &["badword"], now).is_allow());
}

#[test]
fn test_evaluation_has_no_side_effects_on_usage() {
    let mut b = Browser::new();
    b.configure(1, |c| {
        c.times = "0900-1700".into();
        c.limit_mins = Some(10);
        c.limit_period = Some(86400);
    });
    let now = hm(20, 0);
    let before = b.usage(1, now);

    let first = b.engine.evaluate(URL, doc(1), now, false);
    let second = b.engine.evaluate(URL, doc(1), now, false);
    assert_eq!(first, second);
    assert_eq!(b.usage(1, now), before);
    assert!(b.browser.navigations().is_empty());
}

#[test]
fn test_delayed_page_after_focused_countdown() {
    let mut b = Browser::new();
    b.configure(2, |c| {
        c.times = "0000-2400".into();
        c.block_url = DELAYED_BLOCK_URL.into();
        c.delay_secs = 3;
        c.delay_first = true;
    });
    let now = hm(9, 0);

    let verdict = b.open(1, URL, now);
    assert!(matches!(verdict, Verdict::Delay { delay_secs: 3, .. }));
    b.engine.on_focus_changed(doc(1), true, now);

    let mut granted = false;
    for secs in 1..=3 {
        granted |= b
            .engine
            .tick(now + secs)
            .iter()
            .any(|e| matches!(e.payload, EventPayload::OverrideGranted { .. }));
    }
    assert!(granted);
    assert_eq!(b.browser.last_navigation(doc(1)).as_deref(), Some(URL));

    // The whole site is let through while it stays loaded
    let verdict = b
        .engine
        .on_location_change(doc(1), "http://example.com/more", now + 4)
        .unwrap();
    assert!(verdict.is_allow());
}

#[test]
fn test_usage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(dir.path());
    let now = hm(10, 0);

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let mut b = Browser::with_store(store);
        b.configure(1, |c| {
            c.limit_mins = Some(30);
            c.limit_period = Some(86400);
        });
        b.open(1, URL, now);
        b.engine.on_document_closed(doc(1), now + 120);
        b.engine.start_lockdown(&[set(2)], 600, now + 120).unwrap();
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let mut b = Browser::with_store(store);

    let stats = b.engine.stats(set(1), now + 130);
    assert_eq!(stats.total_secs, 120);
    assert_eq!(stats.quota_left_secs, Some(30 * 60 - 120));

    b.configure(2, |_| {});
    assert_eq!(b.open(1, URL, now + 130).blocking_set(), Some(set(2)));
    assert_eq!(b.engine.lockdown_defaults().sets, vec![set(2)]);
}

#[test]
fn test_legacy_and_malformed_usage_records() {
    let b = Browser::new();
    let now = hm(10, 0);

    b.store.set_string(&usage_key(set(1)), "100,50,0,0").unwrap();
    let stats = b.engine.stats(set(1), now);
    assert_eq!(stats.started_at, 100);
    assert_eq!(stats.total_secs, 50);
    assert_eq!(b.usage(1, now).lockdown_until, 0);

    b.store.set_string(&usage_key(set(2)), "1,2,3").unwrap();
    let stats = b.engine.stats(set(2), now);
    assert_eq!(stats.started_at, now);
    assert_eq!(stats.total_secs, 0);
}

#[test]
fn test_policy_file_applied_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let policy_path = dir.path().join("policy.toml");
    std::fs::write(
        &policy_path,
        r#"
            config_version = 1

            [options]
            warn_secs = 120

            [[sets]]
            id = 4
            name = "Social"
            sites = ["example.com", "+example.com/help"]
            times = "0900-1700"
            days = "weekdays"
        "#,
    )
    .unwrap();

    let policy = blockwarden_config::load_config(&policy_path).unwrap();
    let mut b = Browser::new();
    policy.apply(b.store.as_ref(), MONDAY).unwrap();

    let cfg = b.engine.set_config(set(4));
    assert_eq!(cfg.display_name(), "Social");
    assert_eq!(b.engine.options().warn_secs, Some(120));

    assert_eq!(b.open(1, URL, hm(10, 0)).blocking_set(), Some(set(4)));
    assert!(b.open(2, "http://example.com/help", hm(10, 0)).is_allow());

    // Saturday
    assert!(b.open(3, URL, hm(10, 0) + 5 * 86400).is_allow());
}

#[test]
fn test_invalid_policy_rejected() {
    let err = parse_config(
        r#"
            config_version = 1

            [[sets]]
            id = 9
            sites = ["example.com"]
        "#,
    );
    assert!(err.is_err());
}
