//! Sheetdex CLI - browse a spreadsheet-backed dex from the terminal.
//!
//! Reads the mon sheet configured in `config.json` / `SHEETDEX_*` variables
//! and prints mons and their move sheets.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sheetdex_core::link::resolve_link;
use sheetdex_core::{Config, Dex, DexError, GroupedListing, HttpFetcher, Mon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "sheetdex", version, about = "Browse a spreadsheet-backed dex")]
struct Cli {
    /// Mon sheet link (overrides config and SHEETDEX_SHEET_URL)
    #[arg(long, global = true)]
    sheet_url: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every mon
    List,
    /// Show one mon
    Show { id: String },
    /// Show a mon's move sheet
    Moves { id: String },
    /// Resolve a sheet link to its CSV export URL
    Resolve { link: String },
    /// Fetch every mon's move sheet
    Warm,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.sheet_url.clone() {
        config.sheet_url = url;
    }
    config.validate()?;
    info!(sheet_url = %config.sheet_url, persist = config.persist, "Sheetdex starting");

    match cli.command {
        Command::List => {
            let dex = Dex::from_config(&config)?;
            let roster = dex.mons().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(roster.mons())?);
            } else {
                for mon in roster.iter() {
                    println!("{:<24} {:<24} {}", mon.id, mon.name, mon.tags_display());
                }
                if let Some(age) = dex.last_updated().await {
                    eprintln!("{} mons, updated {}", roster.len(), age);
                }
            }
        }
        Command::Show { id } => {
            let dex = Dex::from_config(&config)?;
            let Some(mon) = dex.mon(&id).await else {
                eprintln!("No mon with id '{}'", id);
                return Ok(ExitCode::FAILURE);
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&mon)?);
            } else {
                print_mon(&mon);
            }
        }
        Command::Moves { id } => {
            let dex = Dex::from_config(&config)?;
            match dex.moves_for(&id).await {
                Ok(listing) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(listing.as_ref())?)
                }
                Ok(listing) => print_listing(&listing),
                Err(DexError::MonNotFound(id)) => {
                    eprintln!("No mon with id '{}'", id);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Resolve { link } => {
            let fetcher = HttpFetcher::new(config.fetch_timeout(), config.redirect_timeout())?;
            match resolve_link(&link, &fetcher).await {
                Some(url) => println!("{}", url),
                None => {
                    println!("unresolved");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Warm => {
            let dex = Dex::from_config(&config)?;
            let loaded = dex.warm_moves().await;
            println!("Loaded move sheets for {} mons", loaded);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_mon(mon: &Mon) {
    println!("{} ({})", mon.name, mon.id);
    println!("Type: {}", mon.tags_display());
    if !mon.description.is_empty() {
        println!("\n{}", mon.description);
    }
    if !mon.stats.is_empty() {
        println!();
        for stat in mon.stats.iter() {
            println!("  {:<18} {}", stat.name, stat.value);
        }
        println!("  {:<18} {}", "total", mon.stats.total());
    }
    if !mon.raw_abilities.trim().is_empty() {
        println!("\nAbilities:\n{}", mon.raw_abilities.trim());
    }
    if !mon.image_url.is_empty() {
        println!("\nImage: {}", mon.image_url);
    }
    if !mon.credits.is_empty() {
        println!("Credits: {}", mon.credits);
    }
}

fn print_listing(listing: &GroupedListing) {
    if listing.is_empty() {
        println!("No move sheet available");
        return;
    }
    for group in listing.groups() {
        println!("{}:", group.label);
        for item in &group.items {
            println!("  {}", item);
        }
    }
}
