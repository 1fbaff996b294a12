//! LogiScan CLI - `logiscan` command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logiscan_core::ScanConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod replay;
mod trace;

/// LogiScan - separate barcode scanner bursts from keyboard typing
#[derive(Parser)]
#[command(name = "logiscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log collector decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a keystroke trace and print the accepted scans
    Replay {
        /// Trace file, one `<t_ms> <token>` per line
        trace: PathBuf,

        /// Configuration file with a [scan] table
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one JSON object per scan
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration as TOML
    Defaults,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay {
            trace,
            config,
            json,
        } => run_replay(&trace, config.as_deref(), json),
        Commands::Defaults => {
            print!("{}", ScanConfig::default().to_toml_string());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_replay(trace_path: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ScanConfig::default(),
    };

    let input = std::fs::read_to_string(trace_path)
        .with_context(|| format!("Failed to read trace {}", trace_path.display()))?;
    let events = trace::parse_trace(&input)
        .with_context(|| format!("Invalid trace {}", trace_path.display()))?;

    info!(events = events.len(), "Replaying trace");
    let scans = replay::replay(&events, config).context("Replay failed")?;

    for scan in &scans {
        if json {
            println!("{}", serde_json::to_string(scan)?);
        } else {
            println!("{}\t{}", scan.at, scan.code);
        }
    }

    Ok(())
}
