//! Default paths for blockwarden components
//!
//! Paths are user-writable by default (no root required):
//! - Data: `$XDG_DATA_HOME/blockwarden` or `~/.local/share/blockwarden`
//! - Policy file: `$XDG_CONFIG_HOME/blockwarden/config.toml` or
//!   `~/.config/blockwarden/config.toml`

use std::path::{Path, PathBuf};

/// Environment variable for overriding the data directory
pub const BLOCKWARDEN_DATA_DIR_ENV: &str = "BLOCKWARDEN_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "blockwarden";

/// Preference database filename within the data directory
const DB_FILENAME: &str = "blockwarden.db";

/// Policy filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$BLOCKWARDEN_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/blockwarden` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/blockwarden` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(BLOCKWARDEN_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking BLOCKWARDEN_DATA_DIR.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default policy file path.
pub fn default_config_path() -> PathBuf {
    let dir = if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(config_home).join(APP_DIR)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join(APP_DIR)
    } else {
        PathBuf::from("/etc").join(APP_DIR)
    };
    dir.join(CONFIG_FILENAME)
}

/// Preference database inside a data directory
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_contains_blockwarden() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("blockwarden"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("blockwarden"));
        assert_eq!(path.extension().unwrap(), "toml");
    }

    #[test]
    fn db_path_is_inside_data_dir() {
        let dir = PathBuf::from("/var/lib/blockwarden");
        assert_eq!(db_path(&dir).parent().unwrap(), dir);
    }
}
