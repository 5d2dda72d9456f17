//! Preference key names
//!
//! Per-set keys are suffixed with the set number (`sites1` .. `sites6`).
//! Bitmask keys hold one bit per set, bit `set - 1`.

use blockwarden_store::{PrefStore, StoreResult};
use blockwarden_util::SetId;

// Per-set keys
pub const SET_NAME: &str = "setName";
pub const SITES: &str = "sites";
pub const TIMES: &str = "times";
pub const LIMIT_MINS: &str = "limitMins";
pub const LIMIT_PERIOD: &str = "limitPeriod";
pub const DAYS: &str = "days";
pub const DELAY_SECS: &str = "delaySecs";
pub const BLOCK_URL: &str = "blockURL";

// Bitmask keys
pub const CONJ_MODE: &str = "conjMode";
pub const ACTIVE_BLOCK: &str = "activeBlock";
pub const COUNT_FOCUS: &str = "countFocus";
pub const DELAY_FIRST: &str = "delayFirst";
pub const PREV_OPTS: &str = "prevOpts";
pub const PREV_ADDONS: &str = "prevAddons";
pub const PREV_CONFIG: &str = "prevConfig";

// Global keys
pub const WARN_SECS: &str = "warnSecs";
pub const BLOCK_EMBEDDED: &str = "bep";
pub const REPEAT_CHECK_PERIOD: &str = "repeatCheckPeriod";
pub const LOCKDOWN_DURATION: &str = "lockdownDuration";
pub const LOCKDOWN_SETS: &str = "lockdownSets";

/// Key for a per-set preference
pub fn set_key(name: &str, set: SetId) -> String {
    format!("{name}{set}")
}

pub fn get_bit(prefs: &dyn PrefStore, name: &str, set: SetId) -> StoreResult<bool> {
    Ok(prefs.get_int(name)?.unwrap_or(0) & set.bit() != 0)
}

pub fn set_bit(prefs: &dyn PrefStore, name: &str, set: SetId, value: bool) -> StoreResult<()> {
    let bits = prefs.get_int(name)?.unwrap_or(0);
    let bits = if value { bits | set.bit() } else { bits & !set.bit() };
    prefs.set_int(name, bits)
}

/// Sets whose bit is on in a mask
pub fn sets_in_mask(mask: i64) -> Vec<SetId> {
    SetId::all().filter(|s| mask & s.bit() != 0).collect()
}

pub fn mask_of_sets(sets: &[SetId]) -> i64 {
    sets.iter().fold(0, |m, s| m | s.bit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwarden_store::SqliteStore;

    #[test]
    fn bitmask_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let s2 = SetId::new(2).unwrap();
        let s5 = SetId::new(5).unwrap();

        assert!(!get_bit(&store, CONJ_MODE, s2).unwrap());

        set_bit(&store, CONJ_MODE, s2, true).unwrap();
        set_bit(&store, CONJ_MODE, s5, true).unwrap();
        assert_eq!(store.get_int(CONJ_MODE).unwrap(), Some(0b10010));
        assert!(get_bit(&store, CONJ_MODE, s2).unwrap());

        set_bit(&store, CONJ_MODE, s2, false).unwrap();
        assert!(!get_bit(&store, CONJ_MODE, s2).unwrap());
        assert!(get_bit(&store, CONJ_MODE, s5).unwrap());
    }

    #[test]
    fn masks() {
        let sets = sets_in_mask(0b101);
        assert_eq!(sets, vec![SetId::new(1).unwrap(), SetId::new(3).unwrap()]);
        assert_eq!(mask_of_sets(&sets), 0b101);
        assert_eq!(set_key(SITES, SetId::new(4).unwrap()), "sites4");
    }
}
