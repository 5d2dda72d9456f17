//! Raw policy schema (as parsed from TOML)

use blockwarden_api::BlockMode;
use serde::{Deserialize, Serialize};

/// Raw policy file as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global options
    #[serde(default)]
    pub options: RawOptions,

    /// Block sets to configure; sets not listed keep their settings
    #[serde(default)]
    pub sets: Vec<RawBlockSet>,
}

/// Global options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawOptions {
    /// Seconds left at which to warn; omitted disables warnings
    pub warn_secs: Option<u64>,

    /// Check pages loaded inside frames
    #[serde(default)]
    pub block_embedded: bool,

    /// Period for re-checking open pages, in milliseconds
    pub repeat_check_ms: Option<u64>,
}

/// Raw block set definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBlockSet {
    /// Set number, 1-6
    pub id: u8,

    pub name: Option<String>,

    /// Site patterns, keywords (`~word`) and exceptions (`+site`)
    #[serde(default)]
    pub sites: Vec<String>,

    /// Schedule, e.g. "0900-1200,1300-1700"
    pub times: Option<String>,

    /// Days of week: "weekdays", "weekends", "all", or list like ["mon", "tue"]
    pub days: Option<RawDays>,

    /// Minutes allowed per limit period
    pub limit_mins: Option<u64>,

    /// Limit period in seconds (e.g. 3600, 86400, 604800)
    pub limit_period: Option<u64>,

    #[serde(default)]
    pub mode: BlockMode,

    /// Re-check already open pages and block them too
    #[serde(default)]
    pub active_block: bool,

    /// Count only time during which the page has focus
    #[serde(default)]
    pub count_focus: bool,

    /// "default", "delayed", or a custom address with `$S` / `$U` placeholders
    pub block_page: Option<String>,

    /// Countdown for the delaying page, in seconds
    pub delay_secs: Option<u64>,

    /// Allow the whole site (not just the page) once the countdown ends
    #[serde(default)]
    pub delay_allow_site: bool,

    #[serde(default)]
    pub prevent_options: bool,

    #[serde(default)]
    pub prevent_addons: bool,

    #[serde(default)]
    pub prevent_config: bool,
}

impl RawBlockSet {
    /// Empty definition for a set, with every field at its default
    pub fn new(id: u8) -> Self {
        Self {
            id,
            name: None,
            sites: Vec::new(),
            times: None,
            days: None,
            limit_mins: None,
            limit_period: None,
            mode: BlockMode::Or,
            active_block: false,
            count_focus: false,
            block_page: None,
            delay_secs: None,
            delay_allow_site: false,
            prevent_options: false,
            prevent_addons: false,
            prevent_config: false,
        }
    }
}

/// Days specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDays {
    Preset(String),
    List(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_set() {
        let toml_str = r#"
            config_version = 1

            [[sets]]
            id = 1
            name = "Distractions"
            sites = ["reddit.com", "+reddit.com/r/rust", "~celebrity"]
            times = "0900-1700"
            days = "weekdays"
            mode = "and"
            limit_mins = 30
            limit_period = 3600
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sets.len(), 1);
        let set = &config.sets[0];
        assert_eq!(set.id, 1);
        assert_eq!(set.sites.len(), 3);
        assert_eq!(set.mode, BlockMode::And);
        assert!(matches!(set.days, Some(RawDays::Preset(_))));
    }

    #[test]
    fn parse_options_and_day_list() {
        let toml_str = r#"
            config_version = 1

            [options]
            warn_secs = 60
            block_embedded = true

            [[sets]]
            id = 2
            days = ["sat", "sun"]
            block_page = "delayed"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.options.warn_secs, Some(60));
        assert!(config.options.block_embedded);
        assert!(config.options.repeat_check_ms.is_none());
        let set = &config.sets[0];
        assert_eq!(set.mode, BlockMode::Or);
        assert!(matches!(&set.days, Some(RawDays::List(days)) if days.len() == 2));
    }
}
