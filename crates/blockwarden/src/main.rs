//! blockwarden - site blocker command line host
//!
//! This is the main entry point for the command line host. It wires together:
//! - The preference store in the data directory
//! - The block engine
//! - A simulated page host for checking and watching addresses
//! - Lockdown, usage and site list management

mod host;

use anyhow::{bail, Context, Result};
use blockwarden_api::{Event, EventPayload, StatusSnapshot, TimeLeft, Verdict};
use blockwarden_config::load_config;
use blockwarden_core::BlockEngine;
use blockwarden_host_api::SystemClock;
use blockwarden_store::SqliteStore;
use blockwarden_util::{
    db_path, default_data_dir, format_hms, format_instant, is_mock_time_active, DocHandle, SetId,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::host::PageHost;

/// blockwarden - block sites by schedule, time quota and lockdown
#[derive(Parser, Debug)]
#[command(name = "blockwarden")]
#[command(about = "Block sites by schedule, time quota and lockdown", long_about = None)]
struct Args {
    /// Data directory override (or set BLOCKWARDEN_DATA_DIR env var)
    #[arg(short, long, global = true, env = "BLOCKWARDEN_DATA_DIR", default_value_os_t = default_data_dir())]
    data_dir: PathBuf,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an address once
    Check {
        url: String,

        /// File holding the page text, for keyword matching
        #[arg(long)]
        text: Option<PathBuf>,

        /// Evaluate as a re-check of an already open page
        #[arg(long)]
        repeat: bool,
    },

    /// Keep a page open and check it every second until interrupted
    Watch {
        url: String,

        /// File holding the page text, for keyword matching
        #[arg(long)]
        text: Option<PathBuf>,

        /// Keep the page in the background
        #[arg(long)]
        unfocused: bool,
    },

    /// Show block sets, lockdowns and usage
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start or cancel a lockdown
    Lockdown {
        #[command(subcommand)]
        action: LockdownCommand,
    },

    /// Restart usage statistics
    Restart {
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        set: Option<SetId>,

        /// Restart every set
        #[arg(long)]
        all: bool,
    },

    /// Add a site (or the site of an address) to a set
    AddSite {
        #[arg(long)]
        set: SetId,

        site: String,
    },

    /// Write a policy file into the preferences
    Apply { policy: PathBuf },
}

#[derive(Subcommand, Debug)]
enum LockdownCommand {
    /// Block sets unconditionally for a while; defaults to the last choices
    Start {
        /// Comma-separated set numbers
        #[arg(long, value_delimiter = ',')]
        sets: Vec<SetId>,

        #[arg(long, default_value_t = 0)]
        hours: i64,

        #[arg(long, default_value_t = 0)]
        mins: i64,
    },

    /// End a set's lockdown early
    Cancel {
        #[arg(long)]
        set: SetId,

        /// Confirm the cancellation
        #[arg(long)]
        yes: bool,
    },
}

/// Handle of the single simulated page
const PAGE: DocHandle = DocHandle::new(1);

fn open_store(data_dir: &Path) -> Result<Arc<SqliteStore>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let path = db_path(data_dir);
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open preference store {:?}", path))?;
    info!(db_path = %path.display(), "Store opened");
    Ok(Arc::new(store))
}

fn read_text(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read page text from {:?}", path))?;
            Ok(text.lines().map(str::to_string).collect())
        }
        None => Ok(Vec::new()),
    }
}

/// Lockdown length in seconds from the command line parts
fn lockdown_duration(hours: i64, mins: i64) -> Result<i64> {
    hours
        .checked_mul(3600)
        .zip(mins.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .with_context(|| format!("Lockdown of {} hours {} minutes is too long", hours, mins))
}

fn describe_time_left(time_left: &TimeLeft) -> String {
    match (time_left.seconds, time_left.set) {
        (Some(secs), Some(set)) => format!("{} (set {})", format_hms(secs), set),
        _ => "--:--:--".to_string(),
    }
}

fn describe_set_list(sets: &[SetId]) -> String {
    sets.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_verdict(engine: &BlockEngine, verdict: &Verdict, now: i64) {
    match verdict {
        Verdict::Allow { time_left } => {
            println!("Allowed, time left: {}", describe_time_left(time_left));
        }
        Verdict::Block {
            set,
            target_url,
            blocked_url,
        } => {
            println!("Blocked by set {}: {}", set, blocked_url);
            println!("  Block page: {}", target_url);
            print_unblock_time(engine, *set, now);
        }
        Verdict::Delay {
            set,
            target_url,
            blocked_url,
            delay_secs,
        } => {
            println!("Delayed by set {} for {}s: {}", set, delay_secs, blocked_url);
            println!("  Delaying page: {}", target_url);
            print_unblock_time(engine, *set, now);
        }
    }
}

fn print_unblock_time(engine: &BlockEngine, set: SetId, now: i64) {
    match engine.unblock_time(set, now) {
        Some(at) => println!("  Unblocked at: {}", format_instant(at)),
        None => println!("  Unblocked at: unknown"),
    }
}

fn print_event(event: &Event) {
    match &event.payload {
        EventPayload::WarningIssued { set, seconds_left } => {
            println!("Warning: set {} blocks in {}", set, format_hms(*seconds_left));
        }
        EventPayload::Redirected { set, target_url, .. } => {
            println!("Blocked by set {}, now showing {}", set, target_url);
        }
        EventPayload::CountdownTick { remaining, .. } => {
            println!("Delay: {} left", format_hms(*remaining));
        }
        EventPayload::OverrideGranted { url, .. } => {
            println!("Delay complete, opening {}", url);
        }
        EventPayload::LockdownStarted { sets, until } => {
            println!(
                "Lockdown of set(s) {} until {}",
                describe_set_list(sets),
                format_instant(*until)
            );
        }
        EventPayload::LockdownCancelled { set } => {
            println!("Lockdown of set {} cancelled", set);
        }
        EventPayload::UsageRestarted { set } => {
            println!("Usage statistics of set {} restarted", set);
        }
    }
}

fn print_status(snapshot: &StatusSnapshot) {
    println!("Status at {}", format_instant(snapshot.now));
    for status in &snapshot.sets {
        println!();
        println!("Set {}: {} [{:?}]", status.set, status.name, status.mode);
        if let Some(until) = status.lockdown_until {
            println!("  Lockdown until {}", format_instant(until));
        }
        if status.blocking {
            match status.unblock_at {
                Some(at) => println!("  Blocking, until {}", format_instant(at)),
                None => println!("  Blocking"),
            }
        }

        let stats = &status.stats;
        println!("  Since: {}", format_instant(stats.started_at));
        println!("  Total: {}", format_hms(stats.total_secs));
        println!("  Per day: {}", format_hms(stats.avg_secs_per_day.round() as i64));
        if let Some(left) = stats.quota_left_secs {
            println!("  Quota left: {}", format_hms(left));
        }
    }

    if !snapshot.settings_locked_by.is_empty() {
        println!();
        println!(
            "Settings locked by set(s) {}",
            describe_set_list(&snapshot.settings_locked_by)
        );
    }
}

/// Open the page, then tick once a second until interrupted. Closing the
/// page on exit charges the time spent.
async fn watch(engine: &mut BlockEngine, host: &PageHost, url: &str, text: Vec<String>, focused: bool) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    host.open(PAGE, url, text);
    let now = engine.now();
    let verdict = engine.on_document_opened(PAGE, url, now);
    print_verdict(engine, &verdict, now);
    if focused {
        engine.on_focus_changed(PAGE, true, now);
    }
    for event in engine.take_events() {
        print_event(&event);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately
    ticker.tick().await;

    info!(url = %url, focused, "Watching page");

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, closing page");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, closing page");
                break;
            }
            _ = ticker.tick() => {
                let now = engine.now();
                for event in engine.tick(now) {
                    print_event(&event);
                }
                if !engine.is_open(PAGE) {
                    println!("Page closed");
                    return Ok(());
                }
                let left = engine.time_left(PAGE, now).unwrap_or(TimeLeft::UNLIMITED);
                debug!(url = ?host.url(PAGE), time_left = ?left, "Tick");
                println!("{}  {}", host.url(PAGE).unwrap_or_default(), describe_time_left(&left));
            }
        }
    }

    let now = engine.now();
    engine.on_document_closed(PAGE, now);
    let stats: Vec<String> = SetId::all()
        .map(|set| engine.stats(set, now))
        .filter(|s| s.total_secs > 0)
        .map(|s| format!("set {}: {}", s.set, format_hms(s.total_secs)))
        .collect();
    if !stats.is_empty() {
        println!("Total time: {}", stats.join(", "));
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let store = open_store(&args.data_dir)?;
    let host = Arc::new(PageHost::new());
    let mut engine = BlockEngine::new(store.clone(), host.clone(), Arc::new(SystemClock));
    let now = engine.now();

    match args.command {
        Command::Check { url, text, repeat } => {
            host.open(PAGE, &url, read_text(text.as_deref())?);
            let verdict = engine.evaluate(&url, PAGE, now, repeat);
            print_verdict(&engine, &verdict, now);
            for event in engine.take_events() {
                print_event(&event);
            }
        }

        Command::Watch {
            url,
            text,
            unfocused,
        } => {
            let text = read_text(text.as_deref())?;
            watch(&mut engine, &host, &url, text, !unfocused).await?;
        }

        Command::Status { json } => {
            let snapshot = engine.status(now);
            if json {
                let out = serde_json::to_string_pretty(&snapshot).context("Failed to encode status")?;
                println!("{}", out);
            } else {
                print_status(&snapshot);
            }
        }

        Command::Lockdown {
            action: LockdownCommand::Start { sets, hours, mins },
        } => {
            let defaults = engine.lockdown_defaults();
            let sets = if sets.is_empty() { defaults.sets } else { sets };
            let duration = lockdown_duration(hours, mins)?;
            let duration = if duration == 0 { defaults.duration_secs } else { duration };

            engine
                .start_lockdown(&sets, duration, now)
                .context("Failed to start lockdown")?;
            for event in engine.take_events() {
                print_event(&event);
            }
        }

        Command::Lockdown {
            action: LockdownCommand::Cancel { set, yes },
        } => {
            if !yes {
                bail!("Cancelling the lockdown of set {} needs --yes", set);
            }
            engine
                .cancel_lockdown(set, now)
                .with_context(|| format!("Failed to cancel lockdown of set {}", set))?;
            for event in engine.take_events() {
                print_event(&event);
            }
        }

        Command::Restart { set, all } => {
            let target = if all { None } else { set };
            engine
                .restart_usage(target, now)
                .context("Failed to restart usage statistics")?;
            for event in engine.take_events() {
                print_event(&event);
            }
        }

        Command::AddSite { set, site } => {
            let added = engine
                .add_pattern_to_set(set, &site)
                .with_context(|| format!("Failed to add {:?} to set {}", site, set))?;
            if added {
                println!("Added to set {}: {}", set, engine.set_config(set).sites);
            } else {
                println!("Already in set {}", set);
            }
        }

        Command::Apply { policy } => {
            let policy_data = load_config(&policy)
                .with_context(|| format!("Failed to load policy from {:?}", policy))?;
            policy_data
                .apply(store.as_ref(), now)
                .context("Failed to write policy into the preferences")?;
            println!("Applied {} block set(s) from {}", policy_data.sets.len(), policy.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }

    debug!(version = env!("CARGO_PKG_VERSION"), "blockwarden starting");
    if is_mock_time_active() {
        warn!("Mock time is active, schedules and usage follow the mocked clock");
    }

    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockdown_duration() {
        assert_eq!(lockdown_duration(0, 0).unwrap(), 0);
        assert_eq!(lockdown_duration(2, 30).unwrap(), 9000);
        assert!(lockdown_duration(i64::MAX / 3600 + 1, 0).is_err());
        assert!(lockdown_duration(0, i64::MAX).is_err());
        assert!(lockdown_duration(i64::MAX / 3600, 59).is_err());
    }

    #[test]
    fn test_describe_time_left() {
        assert_eq!(describe_time_left(&TimeLeft::UNLIMITED), "--:--:--");
    }
}
