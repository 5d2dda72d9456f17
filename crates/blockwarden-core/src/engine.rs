//! Block decision engine
//!
//! [`BlockEngine`] owns the per-document state and decides, for each page a
//! document loads, whether one of the six block sets blocks it. Sets are
//! tried in ID order and the first blocking set wins. Time spent on matching
//! pages is charged to the sets' usage records when a document is re-checked,
//! loses focus, navigates away or closes.
//!
//! Timers are deadlines kept in each [`DocumentState`] and fired by
//! [`BlockEngine::tick`], which the host calls about once a second.

use blockwarden_api::{
    Event, EventPayload, SetStats, SetStatus, StatusSnapshot, TimeLeft, Verdict, API_VERSION,
};
use blockwarden_config::{
    BlockSetConfig, GlobalOptions, LockdownDefaults, DELAYED_BLOCK_URL, SETTINGS_URL,
};
use blockwarden_host_api::{BrowserHost, Clock};
use blockwarden_store::PrefStore;
use blockwarden_util::{DocHandle, SetId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::address::{site_for_url, ParsedUrl};
use crate::documents::{ActiveDocuments, DocumentState};
use crate::error::{EngineError, EngineResult};
use crate::ledger::{usage_stats, UsageLedger};
use crate::lockdown::{AccessOverride, DelayCountdown};
use crate::patterns::{PatternCache, SiteMatchers};
use crate::rules::{next_unblock_instant, BlockConditions};

/// The block decision engine
pub struct BlockEngine {
    prefs: Arc<dyn PrefStore>,
    host: Arc<dyn BrowserHost>,
    clock: Arc<dyn Clock>,
    ledger: UsageLedger,
    patterns: PatternCache,
    documents: HashMap<DocHandle, DocumentState>,
    active: ActiveDocuments,
    access: AccessOverride,
    warned: [bool; SetId::COUNT],
    focused: Option<DocHandle>,
    events: Vec<Event>,
}

impl BlockEngine {
    pub fn new(prefs: Arc<dyn PrefStore>, host: Arc<dyn BrowserHost>, clock: Arc<dyn Clock>) -> Self {
        info!(store_healthy = prefs.is_healthy(), "Block engine initialized");

        Self {
            ledger: UsageLedger::new(Arc::clone(&prefs)),
            prefs,
            host,
            clock,
            patterns: PatternCache::new(),
            documents: HashMap::new(),
            active: ActiveDocuments::new(),
            access: AccessOverride::new(),
            warned: [false; SetId::COUNT],
            focused: None,
            events: Vec::new(),
        }
    }

    /// Current time from the engine's clock
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    fn offset_secs(&self, now: i64) -> i32 {
        self.clock.utc_offset_minutes(now) * 60
    }

    /// Global options; unreadable options fall back to defaults
    pub fn options(&self) -> GlobalOptions {
        GlobalOptions::load(self.prefs.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read global options, using defaults");
            GlobalOptions::default()
        })
    }

    /// Settings of a set; unreadable settings fall back to an empty set
    pub fn set_config(&self, set: SetId) -> BlockSetConfig {
        BlockSetConfig::load(self.prefs.as_ref(), set).unwrap_or_else(|e| {
            warn!(set = %set, error = %e, "Failed to read set settings, using defaults");
            BlockSetConfig::new(set)
        })
    }

    fn matchers(&self, cfg: &BlockSetConfig) -> Arc<SiteMatchers> {
        self.patterns.get(cfg.set, &cfg.sites)
    }

    /// Decide whether `url`, loaded in `doc`, is blocked.
    ///
    /// Never fails: unparsable addresses and storage problems allow the page.
    /// Arms the document's re-check timer when a set matches. Does not
    /// navigate; see the document handlers for that.
    pub fn evaluate(&mut self, url: &str, doc: DocHandle, now: i64, is_repeat: bool) -> Verdict {
        let allow = Verdict::Allow {
            time_left: TimeLeft::UNLIMITED,
        };

        let Some(parsed) = ParsedUrl::parse(url) else {
            warn!(url = %url, "Unparsable address, allowing");
            return allow;
        };
        let address = parsed.match_address();
        if !parsed.is_checkable() && !address.starts_with(SETTINGS_URL) {
            return allow;
        }

        let options = self.options();
        let embedded = self.documents.get(&doc).is_some_and(|d| d.embedded);
        if embedded && !options.block_embedded {
            return allow;
        }

        if self.access.allows(&parsed) {
            debug!(doc = %doc, url = %address, "Access override in effect");
            return allow;
        }

        let offset = self.offset_secs(now);
        let mut time_left = TimeLeft::UNLIMITED;

        for set in SetId::all() {
            let cfg = self.set_config(set);
            let matchers = self.matchers(&cfg);
            if !matchers.has_block() || !matches_set(&cfg, &matchers, &address) {
                continue;
            }

            if let Some(state) = self.documents.get_mut(&doc)
                && state.recheck_at.is_none()
            {
                state.recheck_at = Some(now + options.repeat_check_secs());
            }

            let usage = self.ledger.load(set, now);
            let conditions = BlockConditions::evaluate(&cfg, &usage, now, offset);
            let blocks = conditions.should_block(|| {
                !matchers.has_keywords() || self.keywords_match(&matchers, doc)
            });

            if blocks && (!is_repeat || cfg.active_block) {
                let target_url = cfg.block_url_for(&address);
                info!(
                    doc = %doc,
                    set = %set,
                    url = %address,
                    lockdown = conditions.lockdown,
                    repeat = is_repeat,
                    "Page blocked"
                );
                return if cfg.is_delaying() {
                    Verdict::Delay {
                        set,
                        target_url,
                        blocked_url: address,
                        delay_secs: cfg.delay_secs,
                    }
                } else {
                    Verdict::Block {
                        set,
                        target_url,
                        blocked_url: address,
                    }
                };
            }

            time_left = time_left.min_with(conditions.secs_left(), set);
        }

        self.check_warning(time_left, &options, now);

        if let Some(state) = self.documents.get_mut(&doc) {
            state.time_left = time_left;
            state.time_left_at = now;
        }

        Verdict::Allow { time_left }
    }

    fn keywords_match(&self, matchers: &SiteMatchers, doc: DocHandle) -> bool {
        match self.host.document_text(doc) {
            Ok(text) => matchers.matches_text(&text),
            Err(e) => {
                debug!(doc = %doc, error = %e, "No document text, keywords do not match");
                false
            }
        }
    }

    /// Warn once when the time left drops to the threshold; re-arm when it
    /// rises above it again
    fn check_warning(&mut self, time_left: TimeLeft, options: &GlobalOptions, now: i64) {
        let (Some(warn_secs), Some(set), Some(seconds)) =
            (options.warn_secs, time_left.set, time_left.seconds)
        else {
            return;
        };

        if seconds > warn_secs {
            self.warned[set.index()] = false;
        } else if !self.warned[set.index()] {
            self.warned[set.index()] = true;
            info!(set = %set, seconds_left = seconds, "Block warning");
            self.events.push(Event::new(
                now,
                EventPayload::WarningIssued {
                    set,
                    seconds_left: seconds,
                },
            ));
        }
    }

    /// A top-level document loaded `url`. Blocked pages are redirected.
    pub fn on_document_opened(&mut self, doc: DocHandle, url: &str, now: i64) -> Verdict {
        self.open_document(doc, url, false, now)
    }

    /// An embedded frame loaded `url`; only checked when embedded pages are
    /// blocked.
    pub fn on_frame_opened(&mut self, doc: DocHandle, url: &str, now: i64) -> Verdict {
        self.open_document(doc, url, true, now)
    }

    fn open_document(&mut self, doc: DocHandle, url: &str, embedded: bool, now: i64) -> Verdict {
        if self.documents.contains_key(&doc) {
            debug!(doc = %doc, "Handle reused, closing the previous document");
            self.on_document_closed(doc, now);
        }
        debug!(doc = %doc, url = %url, embedded, "Document opened");
        self.documents.insert(doc, DocumentState::new(doc, embedded, now));
        self.load_page(doc, url, now, true)
    }

    /// The address of an open document changed. Re-evaluates only when the
    /// page differs from the one last loaded.
    pub fn on_location_change(&mut self, doc: DocHandle, url: &str, now: i64) -> Option<Verdict> {
        let Some(state) = self.documents.get(&doc) else {
            return Some(self.on_document_opened(doc, url, now));
        };
        if state.page.as_deref() == Some(page_key(url).as_str()) {
            return None;
        }
        Some(self.load_page(doc, url, now, true))
    }

    pub fn on_focus_changed(&mut self, doc: DocHandle, focused: bool, now: i64) {
        if !self.documents.contains_key(&doc) {
            debug!(doc = %doc, "Focus change for unknown document");
            return;
        }

        if focused {
            if let Some(prev) = self.focused
                && prev != doc
            {
                self.on_focus_changed(prev, false, now);
            }
            if let Some(state) = self.documents.get_mut(&doc) {
                if !state.has_focus() {
                    state.start_focus(now);
                }
                if let Some(countdown) = state.countdown.as_mut() {
                    countdown.resume(now);
                }
            }
            self.active.set_active(doc);
            self.focused = Some(doc);
            return;
        }

        if self.focused == Some(doc) {
            self.focused = None;
        }
        let Some(state) = self.documents.get_mut(&doc) else {
            return;
        };
        let secs_focus = state.stop_focus(now);
        let page = state.page.clone();
        if let Some(page) = page
            && secs_focus > 0
        {
            self.update_time_data(doc, &page, 0, secs_focus, now);
        }
    }

    /// Account the document's time and drop its state, timers included
    pub fn on_document_closed(&mut self, doc: DocHandle, now: i64) {
        let Some(state) = self.documents.get_mut(&doc) else {
            debug!(doc = %doc, "Close for unknown document");
            return;
        };
        let (secs_open, secs_focus) = state.stop(now);
        let page = state.page.clone();
        if let Some(page) = page
            && (secs_open > 0 || secs_focus > 0)
        {
            self.update_time_data(doc, &page, secs_open, secs_focus, now);
        }

        self.documents.remove(&doc);
        self.active.remove(doc);
        if self.focused == Some(doc) {
            self.focused = None;
        }
        debug!(doc = %doc, secs_open, secs_focus, "Document closed");
    }

    fn load_page(&mut self, doc: DocHandle, url: &str, now: i64, follow: bool) -> Verdict {
        self.enter_page(doc, url, now);
        let verdict = self.evaluate(url, doc, now, false);
        self.redirect(doc, &verdict, now, follow);
        verdict
    }

    /// Switch the document to a new page: account the previous one, reset
    /// its timers and start tracking the new one
    fn enter_page(&mut self, doc: DocHandle, url: &str, now: i64) {
        self.account(doc, now);
        self.active.remove(doc);

        let parsed = ParsedUrl::parse(url);
        let Some(state) = self.documents.get_mut(&doc) else {
            return;
        };
        state.page = Some(page_key(url));
        state.recheck_at = None;
        state.countdown = None;
        state.time_left = TimeLeft::UNLIMITED;
        state.time_left_at = now;
        let embedded = state.embedded;

        let Some(parsed) = parsed else {
            return;
        };
        if !embedded && parsed.is_checkable() {
            self.access.forget_if_different(&parsed);
        }

        if let Some(countdown) = self.delay_countdown(&parsed, now) {
            info!(
                doc = %doc,
                set = %countdown.set,
                seconds = countdown.remaining,
                "Delay countdown started"
            );
            if let Some(state) = self.documents.get_mut(&doc) {
                state.countdown = Some(countdown);
            }
        }

        if embedded {
            return;
        }
        let address = parsed.match_address();
        for set in SetId::all() {
            let cfg = self.set_config(set);
            if self.matchers(&cfg).matches_url(&address) {
                self.active.add(set, doc);
            }
        }
    }

    /// Countdown for a delaying page carrying `SET&ADDRESS`
    fn delay_countdown(&self, parsed: &ParsedUrl, now: i64) -> Option<DelayCountdown> {
        let prefix = DELAYED_BLOCK_URL
            .split_once('?')
            .map_or(DELAYED_BLOCK_URL, |(base, _)| base);
        if !parsed.page.starts_with(prefix) {
            return None;
        }
        let (set, target) = parsed.blocked_target()?;
        let set: SetId = set.parse().ok()?;
        let cfg = self.set_config(set);
        Some(DelayCountdown::new(set, &target, cfg.delay_secs, now))
    }

    /// Navigate a blocked document to its block page
    fn redirect(&mut self, doc: DocHandle, verdict: &Verdict, now: i64, follow: bool) {
        let (Some(set), Some(target)) = (verdict.blocking_set(), verdict.target_url()) else {
            return;
        };
        let target = target.to_string();

        if let Err(e) = self.host.navigate_to(doc, &target) {
            warn!(doc = %doc, target = %target, error = %e, "Failed to redirect blocked page");
            return;
        }
        self.events.push(Event::new(
            now,
            EventPayload::Redirected {
                doc,
                set,
                target_url: target.clone(),
            },
        ));

        if follow {
            self.load_page(doc, &target, now, false);
        } else {
            self.enter_page(doc, &target, now);
        }
    }

    /// Charge time since the last clocking and restart the clocks
    fn account(&mut self, doc: DocHandle, now: i64) {
        let Some(state) = self.documents.get_mut(&doc) else {
            return;
        };
        let (secs_open, secs_focus) = state.clock(now);
        let page = state.page.clone();
        if let Some(page) = page
            && (secs_open > 0 || secs_focus > 0)
        {
            self.update_time_data(doc, &page, secs_open, secs_focus, now);
        }
    }

    /// Add time to every set whose sites match `page`. Sets counting open
    /// time only charge their most recently focused document.
    fn update_time_data(&self, doc: DocHandle, page: &str, secs_open: i64, secs_focus: i64, now: i64) {
        if self.documents.get(&doc).is_some_and(|d| d.embedded) {
            return;
        }
        let Some(parsed) = ParsedUrl::parse(page) else {
            return;
        };
        if !parsed.is_checkable() {
            return;
        }
        let address = parsed.match_address();
        let offset = self.offset_secs(now);

        for set in SetId::all() {
            let cfg = self.set_config(set);
            if !self.matchers(&cfg).matches_url(&address) {
                continue;
            }
            if !cfg.count_focus && !self.active.is_active(set, doc) {
                continue;
            }
            if let Err(e) = self.ledger.accumulate(&cfg, now, offset, secs_open, secs_focus) {
                warn!(set = %set, doc = %doc, error = %e, "Failed to record usage");
            }
        }
    }

    /// Fire due re-checks and advance delay countdowns. Returns the events
    /// raised since the last call.
    pub fn tick(&mut self, now: i64) -> Vec<Event> {
        let mut handles: Vec<DocHandle> = self.documents.keys().copied().collect();
        handles.sort_by_key(|d| d.raw());

        for doc in handles {
            if self.host.current_url(doc).is_none() {
                debug!(doc = %doc, "Document gone, dropping its timers");
                self.on_document_closed(doc, now);
                continue;
            }
            self.tick_countdown(doc, now);
            self.tick_recheck(doc, now);
        }

        self.take_events()
    }

    fn tick_countdown(&mut self, doc: DocHandle, now: i64) {
        let focused = self.focused == Some(doc);
        let Some(countdown) = self
            .documents
            .get_mut(&doc)
            .and_then(|s| s.countdown.as_mut())
        else {
            return;
        };
        if !countdown.advance(now, focused) {
            return;
        }
        let (set, remaining) = (countdown.set, countdown.remaining);
        let blocked = countdown.blocked_url.clone();

        self.events.push(Event::new(
            now,
            EventPayload::CountdownTick {
                doc,
                set,
                remaining,
            },
        ));
        if remaining > 0 {
            return;
        }

        if let Some(state) = self.documents.get_mut(&doc) {
            state.countdown = None;
        }
        self.grant_override(doc, set, &blocked, now);
    }

    /// Let the delayed page through and go there
    fn grant_override(&mut self, doc: DocHandle, set: SetId, blocked: &str, now: i64) {
        let Some(parsed) = ParsedUrl::parse(blocked) else {
            warn!(doc = %doc, url = %blocked, "Delayed address unparsable, not granting access");
            return;
        };
        if self.set_config(set).delay_first {
            self.access.grant_origin(&parsed.origin);
        } else {
            self.access.grant_page(&parsed.page);
        }
        info!(doc = %doc, set = %set, url = %blocked, "Delay complete, access granted");
        self.events.push(Event::new(
            now,
            EventPayload::OverrideGranted {
                doc,
                set,
                url: blocked.to_string(),
            },
        ));

        match self.host.navigate_to(doc, blocked) {
            Ok(()) => {
                self.load_page(doc, blocked, now, false);
            }
            Err(e) => warn!(doc = %doc, error = %e, "Failed to open delayed page"),
        }
    }

    fn tick_recheck(&mut self, doc: DocHandle, now: i64) {
        let Some(state) = self.documents.get_mut(&doc) else {
            return;
        };
        let (Some(at), Some(page)) = (state.recheck_at, state.page.clone()) else {
            return;
        };
        if now < at {
            return;
        }
        state.recheck_at = None;

        self.account(doc, now);
        let verdict = self.evaluate(&page, doc, now, true);
        debug!(doc = %doc, allowed = verdict.is_allow(), "Repeat check");
        self.redirect(doc, &verdict, now, true);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn is_open(&self, doc: DocHandle) -> bool {
        self.documents.contains_key(&doc)
    }

    pub fn open_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn active_documents(&self) -> &ActiveDocuments {
        &self.active
    }

    pub fn access_override(&self) -> &AccessOverride {
        &self.access
    }

    pub fn countdown(&self, doc: DocHandle) -> Option<&DelayCountdown> {
        self.documents.get(&doc).and_then(|s| s.countdown.as_ref())
    }

    /// Time left for a document, counted down from its last evaluation
    pub fn time_left(&self, doc: DocHandle, now: i64) -> Option<TimeLeft> {
        self.documents.get(&doc).map(|s| s.time_left_at(now))
    }

    /// Time left for the focused document, for a live countdown display
    pub fn seconds_until_next_change(&self, now: i64) -> TimeLeft {
        self.focused
            .and_then(|doc| self.time_left(doc, now))
            .unwrap_or(TimeLeft::UNLIMITED)
    }

    /// When a set will next stop blocking, if that can be estimated
    pub fn unblock_time(&self, set: SetId, now: i64) -> Option<i64> {
        let cfg = self.set_config(set);
        let usage = self.ledger.load(set, now);
        next_unblock_instant(&cfg, &usage, now, self.offset_secs(now))
    }

    pub fn stats(&self, set: SetId, now: i64) -> SetStats {
        let cfg = self.set_config(set);
        let usage = self.ledger.load(set, now);
        usage_stats(&cfg, &usage, now, self.offset_secs(now))
    }

    fn conditions(&self, cfg: &BlockSetConfig, now: i64) -> BlockConditions {
        let usage = self.ledger.load(cfg.set, now);
        BlockConditions::evaluate(cfg, &usage, now, self.offset_secs(now))
    }

    /// Sets that currently deny access to the settings page
    pub fn settings_locked(&self, now: i64) -> Vec<SetId> {
        SetId::all()
            .filter(|set| {
                let cfg = self.set_config(*set);
                if !cfg.prevent_options {
                    return false;
                }
                let conditions = self.conditions(&cfg, now);
                conditions.lockdown || conditions.conditions_hold()
            })
            .collect()
    }

    pub fn status(&self, now: i64) -> StatusSnapshot {
        let offset = self.offset_secs(now);
        let sets = SetId::all()
            .map(|set| {
                let cfg = self.set_config(set);
                let usage = self.ledger.load(set, now);
                let conditions = BlockConditions::evaluate(&cfg, &usage, now, offset);
                let blocking = self.matchers(&cfg).has_block()
                    && (conditions.lockdown || conditions.conditions_hold());

                SetStatus {
                    set,
                    name: cfg.display_name(),
                    mode: cfg.mode,
                    lockdown_until: usage.in_lockdown(now).then_some(usage.lockdown_until),
                    blocking,
                    unblock_at: if blocking {
                        next_unblock_instant(&cfg, &usage, now, offset)
                    } else {
                        None
                    },
                    stats: usage_stats(&cfg, &usage, now, offset),
                }
            })
            .collect();

        StatusSnapshot {
            api_version: API_VERSION,
            now,
            sets,
            settings_locked_by: self.settings_locked(now),
        }
    }

    /// Add a site to a set. Addresses are reduced to their host without
    /// `www.`. Returns false if the site is already listed.
    pub fn add_pattern_to_set(&mut self, set: SetId, pattern: &str) -> EngineResult<bool> {
        let site = site_for_url(pattern).unwrap_or_else(|| pattern.trim().to_string());
        if site.is_empty() || site.contains(char::is_whitespace) {
            return Err(EngineError::InvalidPattern(pattern.to_string()));
        }

        let mut cfg = BlockSetConfig::load(self.prefs.as_ref(), set)?;
        if cfg.sites.split_whitespace().any(|s| s == site) {
            debug!(set = %set, site = %site, "Site already listed");
            return Ok(false);
        }
        if !cfg.sites.trim().is_empty() {
            cfg.sites.push(' ');
        }
        cfg.sites.push_str(&site);
        cfg.save(self.prefs.as_ref(), self.now())?;

        info!(set = %set, site = %site, "Site added");
        Ok(true)
    }

    pub fn update_set_config(&mut self, cfg: &BlockSetConfig) -> EngineResult<()> {
        cfg.save(self.prefs.as_ref(), self.now())?;
        info!(set = %cfg.set, "Set settings updated");
        Ok(())
    }

    /// Restart usage statistics for one set, or all of them
    pub fn restart_usage(&mut self, set: Option<SetId>, now: i64) -> EngineResult<()> {
        let sets: Vec<SetId> = match set {
            Some(set) => vec![set],
            None => SetId::all().collect(),
        };
        for set in sets {
            self.ledger.restart(set, now)?;
            info!(set = %set, "Usage statistics restarted");
            self.events
                .push(Event::new(now, EventPayload::UsageRestarted { set }));
        }
        Ok(())
    }

    /// Last lockdown choices, offered as defaults
    pub fn lockdown_defaults(&self) -> LockdownDefaults {
        LockdownDefaults::load(self.prefs.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read lockdown defaults");
            LockdownDefaults::default()
        })
    }

    /// Block the selected sets unconditionally for `duration_secs`.
    ///
    /// Refused while any lockdown is active. Sets not selected are released,
    /// and access overrides are dropped. Returns the lockdown end.
    pub fn start_lockdown(&mut self, sets: &[SetId], duration_secs: i64, now: i64) -> EngineResult<i64> {
        let Some(until) = now.checked_add(duration_secs).filter(|_| duration_secs > 0) else {
            return Err(EngineError::InvalidDuration(duration_secs));
        };
        if sets.is_empty() {
            return Err(EngineError::NoSetsSelected);
        }
        if let Some(until) = self.ledger.active_lockdown(now) {
            return Err(EngineError::LockdownActive { until });
        }

        LockdownDefaults {
            duration_secs,
            sets: sets.to_vec(),
        }
        .save(self.prefs.as_ref())?;

        for set in SetId::all() {
            let value = if sets.contains(&set) { until } else { 0 };
            self.ledger.set_lockdown(set, value, now)?;
        }
        self.access.clear();

        info!(sets = ?sets, until, duration_secs, "Lockdown started");
        self.events.push(Event::new(
            now,
            EventPayload::LockdownStarted {
                sets: sets.to_vec(),
                until,
            },
        ));
        Ok(until)
    }

    /// End a set's lockdown early. Confirmation is the caller's business.
    pub fn cancel_lockdown(&mut self, set: SetId, now: i64) -> EngineResult<()> {
        self.ledger.clear_lockdown(set, now)?;
        info!(set = %set, "Lockdown cancelled");
        self.events
            .push(Event::new(now, EventPayload::LockdownCancelled { set }));
        Ok(())
    }
}

/// Whether a set applies to `address`: its sites, or a protected browser
/// page the set guards
fn matches_set(cfg: &BlockSetConfig, matchers: &SiteMatchers, address: &str) -> bool {
    let lower = address.to_ascii_lowercase();
    matchers.matches_url(address)
        || (cfg.prevent_addons && lower.starts_with("about:addons"))
        || (cfg.prevent_config
            && (lower.starts_with("about:config") || lower.starts_with("about:support")))
        || (cfg.prevent_options && address.starts_with(SETTINGS_URL))
}

/// Key under which a document's page is remembered
fn page_key(url: &str) -> String {
    ParsedUrl::parse(url)
        .map(|p| p.match_address())
        .unwrap_or_else(|| url.trim().to_string())
}
