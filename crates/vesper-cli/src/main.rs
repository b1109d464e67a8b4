mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vesper_core::clock::FixedClock;
use vesper_core::config::{load_config, resolve_calendar, resolve_data_dir, resolve_vesper_home};
use vesper_core::store::FileStore;
use vesper_core::{EngineEvent, ProgressEngine};

use crate::commands::Output;

#[derive(Parser)]
#[command(name = "vesper", version, about = "Daily devotion checklist and streak tracker")]
struct Cli {
    /// State directory (defaults to ~/.vesper)
    #[arg(long, env = "VESPER_HOME", global = true)]
    home: Option<PathBuf>,
    /// Pin the current time (RFC3339)
    #[arg(long, global = true)]
    now: Option<String>,
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Streak, phase and today's progress
    Status,
    /// Today's checklist
    Today,
    /// Mark a task on today's checklist as done
    Complete { id: String },
    /// Mark a task on today's checklist as not done
    Uncomplete { id: String },
    /// Run staleness and new-day checks
    Resume,
    /// All badges and which are unlocked
    Badges,
    /// Every task available at a streak day
    Tasks {
        #[arg(long)]
        day: Option<u32>,
    },
    /// Phase details for a streak day
    Phase {
        #[arg(long)]
        day: Option<u32>,
    },
    /// Print version information
    Version,
}

fn init_tracing() {
    // Opt-in via RUST_LOG; stdout stays clean for --json.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw.trim())
                .with_context(|| format!("invalid --now timestamp: {raw}"))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

type Engine = ProgressEngine<FileStore, FixedClock>;

fn open_engine(home: Option<PathBuf>, now: Option<&str>) -> Result<Engine> {
    let home = match home {
        Some(home) => home,
        None => resolve_vesper_home().context("resolve vesper home")?,
    };
    let config = load_config(&home).unwrap_or_default();
    tracing::debug!(home = %home.display(), ?config, "opening state");
    let store = FileStore::new(resolve_data_dir(&home, &config));
    let clock = FixedClock::new(parse_now(now)?);
    Ok(ProgressEngine::open(store, clock, resolve_calendar(&config)))
}

/// An explicit `--day` needs no stored state; otherwise today's streak day is used.
fn streak_day_or_open(
    day: Option<u32>,
    open: impl FnOnce() -> Result<Engine>,
) -> Result<(u32, Vec<EngineEvent>)> {
    match day {
        Some(day) => Ok((day, Vec::new())),
        None => {
            let mut engine = open()?;
            let events = engine.take_startup_events();
            Ok((engine.ledger().streak_day(), events))
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    let out = Output::new(cli.json);
    let open = || open_engine(cli.home.clone(), cli.now.as_deref());

    match command {
        Command::Version => {
            println!("vesper {}", vesper_core::version());
            Ok(())
        }
        Command::Status => commands::status(&mut open()?, &out),
        Command::Today => commands::today(&mut open()?, &out),
        Command::Complete { id } => commands::complete(&mut open()?, &id, &out),
        Command::Uncomplete { id } => commands::uncomplete(&mut open()?, &id, &out),
        Command::Resume => commands::resume(&mut open()?, &out),
        Command::Badges => commands::badges(&mut open()?, &out),
        Command::Tasks { day } => {
            let (day, events) = streak_day_or_open(day, open)?;
            commands::tasks(day, &events, &out)
        }
        Command::Phase { day } => {
            let (day, events) = streak_day_or_open(day, open)?;
            commands::phase(day, &events, &out)
        }
    }
}
