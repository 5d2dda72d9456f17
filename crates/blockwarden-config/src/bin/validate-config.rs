//! Policy validation CLI tool
//!
//! Validates a blockwarden policy file and reports any errors.

use blockwarden_config::{ConfigError, CURRENT_CONFIG_VERSION};
use blockwarden_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [policy-file]");
            eprintln!();
            eprintln!("Validates a blockwarden policy file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config policy.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Policy file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match blockwarden_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Policy is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Block sets: {}", policy.sets.len());
            match policy.options.warn_secs {
                Some(secs) => println!("  Warning: {}s before blocking", secs),
                None => println!("  Warning: off"),
            }

            if !policy.sets.is_empty() {
                println!();
                println!("Block sets:");
                for set in &policy.sets {
                    let sites = set.sites.split_whitespace().count();
                    let quota = match set.quota() {
                        Some(q) => format!("{}m per {}s", q.limit_secs / 60, q.period_secs),
                        None => "no limit".into(),
                    };
                    let times = if set.times.is_empty() { "no schedule" } else { set.times.as_str() };
                    println!(
                        "  - {} [{:?}]: {} patterns, {}, {}",
                        set.display_name(),
                        set.mode,
                        sites,
                        times,
                        quota
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Policy validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
                ConfigError::Store(err) => {
                    eprintln!("Preference store error: {}", err);
                }
            }
            ExitCode::from(1)
        }
    }
}
