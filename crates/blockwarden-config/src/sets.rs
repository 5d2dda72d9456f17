//! Typed block set settings over the preference store

use blockwarden_api::BlockMode;
use blockwarden_store::{PrefStore, StoreError, load_usage, save_usage, usage_key};
use blockwarden_util::{DaysOfWeek, MinutePeriod, SetId, parse_windows};
use tracing::{info, warn};

use crate::keys::{self, get_bit, set_bit, set_key};
use crate::validation::{normalize_sites, parse_pos_int};
use crate::ConfigResult;

/// Built-in block page; `$S` is replaced by the set and `$U` by the page
pub const DEFAULT_BLOCK_URL: &str = "blockwarden://blocked?$S&$U";

/// Built-in delaying page
pub const DELAYED_BLOCK_URL: &str = "blockwarden://delayed?$S&$U";

/// Address of the options surface guarded by `prevOpts`
pub const SETTINGS_URL: &str = "blockwarden://options";

pub const ALL_DAY_TIMES: &str = "0000-2400";

pub const DEFAULT_DELAY_SECS: i64 = 60;
pub const DEFAULT_REPEAT_CHECK_MS: i64 = 5000;

/// Time limit of a set: `limit_secs` of use per `period_secs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit_secs: i64,
    pub period_secs: i64,
}

/// Settings of one block set
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSetConfig {
    pub set: SetId,
    pub name: String,
    /// Whitespace-separated site and keyword tokens
    pub sites: String,
    /// Schedule text, `HHMM-HHMM` tokens
    pub times: String,
    pub days: DaysOfWeek,
    pub limit_mins: Option<i64>,
    pub limit_period: Option<i64>,
    pub mode: BlockMode,
    pub active_block: bool,
    pub count_focus: bool,
    pub delay_secs: i64,
    /// Grant the delay override for the whole origin instead of the page
    pub delay_first: bool,
    pub block_url: String,
    pub prevent_options: bool,
    pub prevent_addons: bool,
    pub prevent_config: bool,
}

impl BlockSetConfig {
    pub fn new(set: SetId) -> Self {
        Self {
            set,
            name: String::new(),
            sites: String::new(),
            times: String::new(),
            days: DaysOfWeek::ALL_DAYS,
            limit_mins: None,
            limit_period: None,
            mode: BlockMode::Or,
            active_block: false,
            count_focus: false,
            delay_secs: DEFAULT_DELAY_SECS,
            delay_first: false,
            block_url: DEFAULT_BLOCK_URL.to_string(),
            prevent_options: false,
            prevent_addons: false,
            prevent_config: false,
        }
    }

    /// Read a set's settings; absent keys take their defaults
    pub fn load(prefs: &dyn PrefStore, set: SetId) -> ConfigResult<Self> {
        let defaults = Self::new(set);
        let get_str = |name: &str| prefs.get_string(&set_key(name, set));

        let days = match prefs.get_int(&set_key(keys::DAYS, set)) {
            Ok(Some(mask)) => DaysOfWeek::new(mask as u8),
            Ok(None) => defaults.days,
            Err(StoreError::BadValue { key, value }) => {
                warn!(key = %key, value = %value, "Ignoring malformed day selection");
                defaults.days
            }
            Err(e) => return Err(e.into()),
        };

        let delay_secs = get_str(keys::DELAY_SECS)?
            .as_deref()
            .and_then(parse_pos_int)
            .unwrap_or(defaults.delay_secs);

        let mode = if get_bit(prefs, keys::CONJ_MODE, set)? {
            BlockMode::And
        } else {
            BlockMode::Or
        };

        Ok(Self {
            set,
            name: get_str(keys::SET_NAME)?.unwrap_or_default(),
            sites: get_str(keys::SITES)?.unwrap_or_default(),
            times: get_str(keys::TIMES)?.unwrap_or_default(),
            days,
            limit_mins: get_str(keys::LIMIT_MINS)?.as_deref().and_then(parse_pos_int),
            limit_period: get_str(keys::LIMIT_PERIOD)?.as_deref().and_then(parse_pos_int),
            mode,
            active_block: get_bit(prefs, keys::ACTIVE_BLOCK, set)?,
            count_focus: get_bit(prefs, keys::COUNT_FOCUS, set)?,
            delay_secs,
            delay_first: get_bit(prefs, keys::DELAY_FIRST, set)?,
            block_url: get_str(keys::BLOCK_URL)?.unwrap_or(defaults.block_url),
            prevent_options: get_bit(prefs, keys::PREV_OPTS, set)?,
            prevent_addons: get_bit(prefs, keys::PREV_ADDONS, set)?,
            prevent_config: get_bit(prefs, keys::PREV_CONFIG, set)?,
        })
    }

    /// Write a set's settings.
    ///
    /// The site list is normalised first. When the limit period differs
    /// from the stored one, the quota window of the usage record is reset;
    /// an unreadable record is restarted at `now`.
    pub fn save(&self, prefs: &dyn PrefStore, now: i64) -> ConfigResult<()> {
        let set = self.set;
        let put = |name: &str, value: &str| prefs.set_string(&set_key(name, set), value);
        let opt = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();

        let new_period = opt(self.limit_period);
        let old_period = prefs
            .get_string(&set_key(keys::LIMIT_PERIOD, set))?
            .unwrap_or_default();
        if new_period != old_period && prefs.get_string(&usage_key(set))?.is_some() {
            let mut usage = load_usage(prefs, set, now)?;
            usage.window_anchor = 0;
            usage.window_seconds = 0;
            save_usage(prefs, set, &usage)?;
            info!(set = %set, old = %old_period, new = %new_period, "Limit period changed, quota window reset");
        }

        put(keys::SET_NAME, &self.name)?;
        put(keys::SITES, &normalize_sites(&self.sites))?;
        put(keys::TIMES, &self.times)?;
        prefs.set_int(&set_key(keys::DAYS, set), self.days.bits() as i64)?;
        put(keys::LIMIT_MINS, &opt(self.limit_mins))?;
        put(keys::LIMIT_PERIOD, &new_period)?;
        put(keys::DELAY_SECS, &self.delay_secs.to_string())?;
        put(keys::BLOCK_URL, &self.block_url)?;

        set_bit(prefs, keys::CONJ_MODE, set, self.mode == BlockMode::And)?;
        set_bit(prefs, keys::ACTIVE_BLOCK, set, self.active_block)?;
        set_bit(prefs, keys::COUNT_FOCUS, set, self.count_focus)?;
        set_bit(prefs, keys::DELAY_FIRST, set, self.delay_first)?;
        set_bit(prefs, keys::PREV_OPTS, set, self.prevent_options)?;
        set_bit(prefs, keys::PREV_ADDONS, set, self.prevent_addons)?;
        set_bit(prefs, keys::PREV_CONFIG, set, self.prevent_config)?;

        Ok(())
    }

    /// Name for display; unnamed sets are "Block Set N"
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Block Set {}", self.set)
        } else {
            self.name.clone()
        }
    }

    pub fn windows(&self) -> Vec<MinutePeriod> {
        parse_windows(&self.times)
    }

    pub fn has_schedule(&self) -> bool {
        !self.times.trim().is_empty()
    }

    /// Time limit, if both parts are set. A limit too large to count in
    /// seconds is no limit.
    pub fn quota(&self) -> Option<Quota> {
        match (self.limit_mins, self.limit_period) {
            (Some(mins), Some(period)) => Some(Quota {
                limit_secs: mins.checked_mul(60)?,
                period_secs: period,
            }),
            _ => None,
        }
    }

    /// Blocked all day, every day, in OR mode
    pub fn is_always_blocked(&self) -> bool {
        self.times.trim() == ALL_DAY_TIMES && self.days.is_all() && self.mode == BlockMode::Or
    }

    pub fn is_delaying(&self) -> bool {
        self.block_url == DELAYED_BLOCK_URL
    }

    /// Block page address for a blocked page
    pub fn block_url_for(&self, page: &str) -> String {
        self.block_url
            .replace("$S", &self.set.to_string())
            .replace("$U", page)
    }
}

/// Global options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Warn when this many seconds or fewer are left; `None` disables warnings
    pub warn_secs: Option<i64>,
    /// Check documents loaded as embedded frames
    pub block_embedded: bool,
    /// Re-check period for open pages, in milliseconds
    pub repeat_check_ms: i64,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            warn_secs: None,
            block_embedded: false,
            repeat_check_ms: DEFAULT_REPEAT_CHECK_MS,
        }
    }
}

impl GlobalOptions {
    pub fn load(prefs: &dyn PrefStore) -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            warn_secs: prefs
                .get_string(keys::WARN_SECS)?
                .as_deref()
                .and_then(parse_pos_int),
            block_embedded: prefs
                .get_bool(keys::BLOCK_EMBEDDED)
                .unwrap_or(None)
                .unwrap_or(defaults.block_embedded),
            repeat_check_ms: prefs
                .get_int(keys::REPEAT_CHECK_PERIOD)
                .unwrap_or(None)
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.repeat_check_ms),
        })
    }

    pub fn save(&self, prefs: &dyn PrefStore) -> ConfigResult<()> {
        let warn = self.warn_secs.map(|s| s.to_string()).unwrap_or_default();
        prefs.set_string(keys::WARN_SECS, &warn)?;
        prefs.set_bool(keys::BLOCK_EMBEDDED, self.block_embedded)?;
        prefs.set_int(keys::REPEAT_CHECK_PERIOD, self.repeat_check_ms)?;
        Ok(())
    }

    /// Re-check period in whole seconds, at least one
    pub fn repeat_check_secs(&self) -> i64 {
        ((self.repeat_check_ms + 999) / 1000).max(1)
    }
}

/// Last lockdown duration and set selection, offered as defaults
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockdownDefaults {
    pub duration_secs: i64,
    pub sets: Vec<SetId>,
}

impl LockdownDefaults {
    pub fn load(prefs: &dyn PrefStore) -> ConfigResult<Self> {
        Ok(Self {
            duration_secs: prefs.get_int(keys::LOCKDOWN_DURATION)?.unwrap_or(0),
            sets: keys::sets_in_mask(prefs.get_int(keys::LOCKDOWN_SETS)?.unwrap_or(0)),
        })
    }

    pub fn save(&self, prefs: &dyn PrefStore) -> ConfigResult<()> {
        prefs.set_int(keys::LOCKDOWN_DURATION, self.duration_secs)?;
        prefs.set_int(keys::LOCKDOWN_SETS, keys::mask_of_sets(&self.sets))?;
        Ok(())
    }
}
