//! Command-line front end: enter a week of prices, see the pattern.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stalk_analyzer::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stalk-analyzer", version, about = "Classify a week of prices into a trend pattern")]
struct Cli {
    /// JSON file the prices are kept in between runs
    #[arg(long, default_value = "stalk-prices.json")]
    store: PathBuf,

    /// Optional JSON session config (debounce_ms, storage_key)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enter prices in slot order (day1am, day1pm, ... day6pm); `_` marks a missing reading
    Analyze {
        prices: Vec<String>,

        /// Classify without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Change one saved reading, e.g. `set day3pm 105`
    Set { slot: Slot, price: String },
    /// Show the saved prices and their pattern
    Show,
    /// Forget the saved prices
    Reset,
}

#[derive(Debug, serde::Serialize)]
struct Report<'a> {
    slots: Vec<(String, PriceSample)>,
    #[serde(flatten)]
    analysis: Analysis,
    label: &'a str,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let mut session = Session::new(JsonFileStore::new(&cli.store), config);

    match &cli.command {
        Command::Analyze { prices, dry_run } => {
            if prices.len() > SLOT_COUNT {
                bail!("at most {SLOT_COUNT} prices, got {}", prices.len());
            }
            session.on_series_edited(prices);
            if !dry_run {
                session.flush();
            }
        }
        Command::Set { slot, price } => {
            session.restore();
            session.on_slot_edited(*slot, price);
            session.flush();
        }
        Command::Show => {
            session.restore();
        }
        Command::Reset => {
            session.on_reset();
        }
    }

    if let Some(e) = session.take_store_error() {
        eprintln!("warning: prices were not persisted: {e}");
    }

    print_report(&session, cli.json)
}

fn print_report<S: KeyValueStore>(session: &Session<S>, json: bool) -> Result<()> {
    let analysis = session.analysis();
    let label = analysis.pattern.label();

    if json {
        let report = Report {
            slots: Slot::all()
                .map(|slot| (slot.to_string(), session.sample(slot)))
                .collect(),
            analysis,
            label,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for slot in Slot::all() {
        let value = session
            .sample(slot)
            .map(|price| price.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<8} {:>8}", slot.to_string(), value);
    }
    println!();
    println!("signal   {}", analysis.signal);
    println!("pattern  {label}");
    Ok(())
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
