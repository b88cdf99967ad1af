//! CLI interface for trackline.
//!
//! Works on session snapshot files: print the merged timeline, or jump the
//! snapshot's clock to an entry. Each subcommand is non-interactive:
//! arguments in, plain text (or JSON) out.

mod format;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jiff::Timestamp;

use trackline::config::Config;
use trackline::model::EventKey;
use trackline::session::{Session, SessionSnapshot};

use format::{format_report, format_row};

/// trackline: merge flags and stops into one day-agnostic timeline.
#[derive(Debug, Parser)]
#[command(name = "trackline", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. trackline timeline session.json
     → lists stops and flags in time-of-day order, with indices
  2. trackline jump session.json --index 3
  3. trackline jump session.json --key stop:loc-12 --write
     → also saves the moved, paused clock back into session.json

Configuration is read from $TRACKLINE_CONFIG or ~/.trackline/config.toml.
Set RUST_LOG=debug to see how each entry was placed."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the merged timeline of a session.
    Timeline {
        /// Session snapshot file.
        session: PathBuf,

        /// Print events as JSON instead of one line per entry.
        #[arg(long)]
        json: bool,
    },

    /// Jump the session clock to a timeline entry.
    ///
    /// The target is clamped into the clock window and playback is paused.
    Jump {
        /// Session snapshot file.
        session: PathBuf,

        /// Entry index as printed by `timeline`.
        #[arg(long, conflicts_with = "key", required_unless_present = "key")]
        index: Option<usize>,

        /// Entry key, e.g. `flag:abc123` or `stop:loc-12`.
        #[arg(long)]
        key: Option<EventKey>,

        /// Write the updated clock back into the session file.
        #[arg(long)]
        write: bool,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Timeline { session, json } => cmd_timeline(config, &session, json),
        Command::Jump {
            session,
            index,
            key,
            write,
        } => cmd_jump(config, &session, index, key.as_ref(), write),
    }
}

fn load(path: &Path) -> Result<SessionSnapshot, String> {
    SessionSnapshot::load(path).map_err(|e| format!("failed to load session: {e}"))
}

fn cmd_timeline(config: &Config, path: &Path, json: bool) -> Result<(), String> {
    let snapshot = load(path)?;
    let session = Session::open(&snapshot, config);

    if json {
        let json = serde_json::to_string_pretty(&session.events())
            .map_err(|e| format!("failed to serialize timeline: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let rows = session.rows(Timestamp::now());
    if rows.is_empty() {
        println!("No events");
        return Ok(());
    }

    let tz = config.time_zone()?;
    for (index, row) in rows.iter().enumerate() {
        println!("{}", format_row(index, row, &tz));
    }
    Ok(())
}

fn cmd_jump(
    config: &Config,
    path: &Path,
    index: Option<usize>,
    key: Option<&EventKey>,
    write: bool,
) -> Result<(), String> {
    let snapshot = load(path)?;
    let mut session = Session::open(&snapshot, config);
    let now = Timestamp::now();

    let report = match (index, key) {
        (Some(index), _) => session.jump_to_index(index, now),
        (None, Some(key)) => session.jump_to_key(key, now),
        (None, None) => return Err("specify --index or --key".to_string()),
    }
    .map_err(|e| format!("jump failed: {e}"))?;

    let tz = config.time_zone()?;
    println!("{}", format_report(&report, &tz));

    if write {
        session
            .snapshot(&snapshot)
            .save(path)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        eprintln!("Clock saved to {}", path.display());
    }

    Ok(())
}
