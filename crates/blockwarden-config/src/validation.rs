//! Configuration validation
//!
//! Format checks run before settings are persisted. The engine itself parses
//! leniently and never rejects stored values.

use crate::schema::{RawBlockSet, RawConfig, RawDays};
use blockwarden_util::SetId;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

static TIMES_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d\d\d\d-\d\d\d\d([, ]+\d\d\d\d-\d\d\d\d)*$").unwrap()
});

static POS_INT_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*$").unwrap());

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+:/+").unwrap());

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Block set {set}: {message}")]
    SetError { set: u8, message: String },

    #[error("Block set id out of range: {0} (expected 1-6)")]
    InvalidSetId(u8),

    #[error("Duplicate block set: {0}")]
    DuplicateSet(u8),

    #[error("Block set {set}: invalid times '{value}' (expected HHMM-HHMM list)")]
    InvalidTimes { set: u8, value: String },

    #[error("Invalid day specification: {0}")]
    InvalidDaySpec(String),

    #[error("Global option error: {0}")]
    GlobalError(String),
}

/// Empty, or `HHMM-HHMM` tokens separated by commas and/or spaces
pub fn check_times_format(times: &str) -> bool {
    times.is_empty() || TIMES_FORMAT.is_match(times)
}

/// Largest accepted limit, period or delay value
pub const MAX_POS_INT: i64 = 1_000_000_000;

/// Empty, or a positive integer without leading zeros, at most
/// [`MAX_POS_INT`]
pub fn check_pos_int_format(value: &str) -> bool {
    value.is_empty()
        || (POS_INT_FORMAT.is_match(value)
            && value.parse::<i64>().is_ok_and(|n| n <= MAX_POS_INT))
}

/// Parse a stored positive integer; empty or malformed text is `None`
pub fn parse_pos_int(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() || !check_pos_int_format(value) {
        return None;
    }
    value.parse().ok()
}

/// Collapse whitespace, strip `scheme://` prefixes and sort the tokens
pub fn normalize_sites(sites: &str) -> String {
    let mut tokens: Vec<String> = sites
        .split_whitespace()
        .map(|t| SCHEME_PREFIX.replace_all(t, "").into_owned())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort();
    tokens.join(" ")
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for set in &config.sets {
        if SetId::new(set.id).is_none() {
            errors.push(ValidationError::InvalidSetId(set.id));
        } else if !seen.insert(set.id) {
            errors.push(ValidationError::DuplicateSet(set.id));
        }
    }

    for set in &config.sets {
        errors.extend(validate_set(set));
    }

    if config.options.repeat_check_ms == Some(0) {
        errors.push(ValidationError::GlobalError(
            "repeat_check_ms must be positive".into(),
        ));
    }
    if config.options.warn_secs == Some(0) {
        errors.push(ValidationError::GlobalError(
            "warn_secs must be positive (omit it to disable warnings)".into(),
        ));
    }

    errors
}

/// Validate one block set
pub fn validate_set(set: &RawBlockSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let id = set.id;

    if let Some(times) = &set.times {
        if !check_times_format(times) {
            errors.push(ValidationError::InvalidTimes {
                set: id,
                value: times.clone(),
            });
        } else if let Some(bad) = blockwarden_util::parse_windows(times)
            .iter()
            .find(|p| p.start > p.end || p.end > blockwarden_util::MINUTES_PER_DAY)
        {
            errors.push(ValidationError::SetError {
                set: id,
                message: format!("time period {}-{} is out of range", bad.start, bad.end),
            });
        }
    }

    if let Some(days) = &set.days
        && let Err(e) = parse_days(days)
    {
        errors.push(ValidationError::InvalidDaySpec(e));
    }

    for (field, value) in [
        ("limit_mins", set.limit_mins),
        ("limit_period", set.limit_period),
        ("delay_secs", set.delay_secs),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::SetError {
                set: id,
                message: format!("{field} must be a positive integer"),
            });
        } else if value.is_some_and(|v| v > MAX_POS_INT as u64) {
            errors.push(ValidationError::SetError {
                set: id,
                message: format!("{field} must be at most {MAX_POS_INT}"),
            });
        }
    }

    if set.limit_mins.is_some() != set.limit_period.is_some() {
        errors.push(ValidationError::SetError {
            set: id,
            message: "limit_mins and limit_period must be given together".into(),
        });
    }

    if set.prevent_options && set.times.as_deref() == Some(crate::ALL_DAY_TIMES) {
        tracing::warn!(set = id, "Options will be locked all day for this set");
    }

    errors
}

/// Parse a day specification into a mask with Sunday as bit 0
pub fn parse_days(days: &RawDays) -> Result<u8, String> {
    match days {
        RawDays::Preset(preset) => match preset.to_lowercase().as_str() {
            "all" | "every" | "daily" => Ok(0x7F),
            "weekdays" => Ok(0x3E), // Mon-Fri
            "weekends" => Ok(0x41), // Sat, Sun
            other => Err(format!("Unknown day preset: {}", other)),
        },
        RawDays::List(list) => {
            let mut mask = 0u8;
            for day in list {
                let bit = match day.to_lowercase().as_str() {
                    "sun" | "sunday" => 1 << 0,
                    "mon" | "monday" => 1 << 1,
                    "tue" | "tuesday" => 1 << 2,
                    "wed" | "wednesday" => 1 << 3,
                    "thu" | "thursday" => 1 << 4,
                    "fri" | "friday" => 1 << 5,
                    "sat" | "saturday" => 1 << 6,
                    other => return Err(format!("Unknown day: {}", other)),
                };
                mask |= bit;
            }
            Ok(mask)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_times_format() {
        assert!(check_times_format(""));
        assert!(check_times_format("0900-1700"));
        assert!(check_times_format("0000-0830,1200-1300"));
        assert!(check_times_format("0000-0830, 1200-1300 2200-2400"));

        assert!(!check_times_format("9:00-17:00"));
        assert!(!check_times_format("0900-1700,"));
        assert!(!check_times_format(" 0900-1700"));
        assert!(!check_times_format("0900"));
    }

    #[test]
    fn test_check_pos_int_format() {
        assert!(check_pos_int_format(""));
        assert!(check_pos_int_format("1"));
        assert!(check_pos_int_format("3600"));
        assert!(!check_pos_int_format("0"));
        assert!(!check_pos_int_format("007"));
        assert!(!check_pos_int_format("-5"));
        assert!(!check_pos_int_format("1.5"));

        assert_eq!(parse_pos_int("60"), Some(60));
        assert_eq!(parse_pos_int(""), None);
        assert_eq!(parse_pos_int("0"), None);

        assert!(check_pos_int_format("1000000000"));
        assert!(!check_pos_int_format("1000000001"));
        assert!(!check_pos_int_format("999999999999999999"));
        assert!(!check_pos_int_format("99999999999999999999999"));
        assert_eq!(parse_pos_int("999999999999999999"), None);
    }

    #[test]
    fn test_normalize_sites() {
        assert_eq!(normalize_sites(""), "");
        assert_eq!(
            normalize_sites("  reddit.com\n\thttp://www.example.com ~news   +https://reddit.com/r/rust "),
            "+reddit.com/r/rust reddit.com www.example.com ~news"
        );
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(&RawDays::Preset("weekdays".into())).unwrap(), 0x3E);
        assert_eq!(parse_days(&RawDays::Preset("weekends".into())).unwrap(), 0x41);
        assert_eq!(parse_days(&RawDays::Preset("all".into())).unwrap(), 0x7F);
        assert!(parse_days(&RawDays::Preset("someday".into())).is_err());

        assert_eq!(
            parse_days(&RawDays::List(vec!["sun".into(), "wed".into(), "sat".into()])).unwrap(),
            0b1001001
        );
        assert!(parse_days(&RawDays::List(vec!["funday".into()])).is_err());
    }

    #[test]
    fn test_set_validation() {
        let mut set = RawBlockSet::new(1);
        assert!(validate_set(&set).is_empty());

        set.times = Some("9-5".into());
        set.limit_mins = Some(30);
        let errors = validate_set(&set);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidTimes { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::SetError { .. })));

        let mut set = RawBlockSet::new(2);
        set.times = Some("1700-0900".into());
        assert_eq!(validate_set(&set).len(), 1);

        let mut set = RawBlockSet::new(3);
        set.limit_mins = Some(999_999_999_999_999_999);
        set.limit_period = Some(3600);
        let errors = validate_set(&set);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("limit_mins must be at most"));
    }

    #[test]
    fn test_duplicate_and_range_detection() {
        let config = RawConfig {
            config_version: 1,
            options: Default::default(),
            sets: vec![RawBlockSet::new(1), RawBlockSet::new(1), RawBlockSet::new(7)],
        };

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateSet(1))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidSetId(7))));
    }
}
