//! Validated policy structures

use crate::schema::{RawBlockSet, RawConfig, RawOptions};
use crate::sets::{BlockSetConfig, DEFAULT_BLOCK_URL, DELAYED_BLOCK_URL, DEFAULT_REPEAT_CHECK_MS, GlobalOptions};
use crate::validation::parse_days;
use crate::ConfigResult;
use blockwarden_store::PrefStore;
use blockwarden_util::{DaysOfWeek, SetId};
use tracing::info;

/// Validated policy ready to be written to the preference store
#[derive(Debug, Clone)]
pub struct Policy {
    pub options: GlobalOptions,

    /// Block sets named by the policy, in id order
    pub sets: Vec<BlockSetConfig>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let mut sets: Vec<BlockSetConfig> = raw
            .sets
            .into_iter()
            .filter_map(convert_set)
            .collect();
        sets.sort_by_key(|s| s.set);

        Self {
            options: convert_options(raw.options),
            sets,
        }
    }

    pub fn get_set(&self, set: SetId) -> Option<&BlockSetConfig> {
        self.sets.iter().find(|s| s.set == set)
    }

    /// Write the policy into a preference store.
    ///
    /// Sets the policy does not name keep their stored settings.
    pub fn apply(&self, prefs: &dyn PrefStore, now: i64) -> ConfigResult<()> {
        self.options.save(prefs)?;
        for set in &self.sets {
            set.save(prefs, now)?;
        }
        info!(sets = self.sets.len(), "Policy applied");
        Ok(())
    }
}

fn convert_options(raw: RawOptions) -> GlobalOptions {
    GlobalOptions {
        warn_secs: raw.warn_secs.map(|s| s as i64),
        block_embedded: raw.block_embedded,
        repeat_check_ms: raw
            .repeat_check_ms
            .map(|ms| ms as i64)
            .unwrap_or(DEFAULT_REPEAT_CHECK_MS),
    }
}

fn convert_set(raw: RawBlockSet) -> Option<BlockSetConfig> {
    let set = SetId::new(raw.id)?;
    let mut cfg = BlockSetConfig::new(set);

    cfg.name = raw.name.unwrap_or_default();
    cfg.sites = raw.sites.join(" ");
    cfg.times = raw.times.unwrap_or_default();
    cfg.days = raw
        .days
        .as_ref()
        .and_then(|d| parse_days(d).ok())
        .map(DaysOfWeek::new)
        .unwrap_or(DaysOfWeek::ALL_DAYS);
    cfg.limit_mins = raw.limit_mins.map(|m| m as i64);
    cfg.limit_period = raw.limit_period.map(|p| p as i64);
    cfg.mode = raw.mode;
    cfg.active_block = raw.active_block;
    cfg.count_focus = raw.count_focus;
    if let Some(secs) = raw.delay_secs {
        cfg.delay_secs = secs as i64;
    }
    cfg.delay_first = raw.delay_allow_site;
    cfg.block_url = match raw.block_page.as_deref() {
        None | Some("default") => DEFAULT_BLOCK_URL.to_string(),
        Some("delayed") => DELAYED_BLOCK_URL.to_string(),
        Some(url) => url.to_string(),
    };
    cfg.prevent_options = raw.prevent_options;
    cfg.prevent_addons = raw.prevent_addons;
    cfg.prevent_config = raw.prevent_config;

    Some(cfg)
}
