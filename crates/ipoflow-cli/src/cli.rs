//! CLI argument definitions for ipoflow.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `report` | Full catalyst report for a ticker |
//! | `holders` | Top mutual fund holders of a ticker |
//! | `deadlines` | Deadlines and inclusion outlook from a listing date, offline |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve deterministic offline data |
//! | `--timeout-ms` | `5000` | Per provider call timeout |
//! | `--max-retries` | `2` | Retries after a throttled call |
//! | `--no-cache` | `false` | Bypass the in-process provider cache |
//! | `--as-of` | today (UTC) | Date used for deadline status and returns |
//! | `-v` | warn | Log verbosity on stderr (`-v` info, `-vv` debug) |
//!
//! # Examples
//!
//! ```bash
//! ipoflow report ARM --format table
//! ipoflow report RXRX --sector healthcare-biotech --pretty
//! ipoflow deadlines --first-trade 2024-03-01 --as-of 2024-03-27
//! ```

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use ipoflow_core::SectorOverride;

#[derive(Debug, Parser)]
#[command(
    name = "ipoflow",
    author,
    version,
    about = "Post-IPO catalyst tracker",
    long_about = "ipoflow estimates the mechanical milestones that follow an IPO \
(quiet period, lock-up expiry) and the passive indices likely to add the stock, \
alongside price and return metrics.\n\
\n\
Use 'ipoflow <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use deterministic offline data instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Timeout for each provider call in milliseconds.
    #[arg(long, global = true, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Retries after the provider throttles a call (exponential, 2s base).
    #[arg(long, global = true, default_value_t = 2)]
    pub max_retries: u32,

    /// Bypass the in-process provider cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today.
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub as_of: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Human-readable table.
    Table,
}

/// Sector rule selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectorSelector {
    /// Detect from the provider's sector and industry.
    Auto,
    HealthcareBiotech,
    TechnologyGrowth,
    /// Skip sector-specific indices.
    Other,
}

impl From<SectorSelector> for SectorOverride {
    fn from(selector: SectorSelector) -> Self {
        match selector {
            SectorSelector::Auto => Self::AutoDetect,
            SectorSelector::HealthcareBiotech => Self::HealthcareBiotech,
            SectorSelector::TechnologyGrowth => Self::TechnologyGrowth,
            SectorSelector::Other => Self::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full catalyst report: metrics, deadlines and index or holder outlook.
    Report(ReportArgs),
    /// Top mutual fund holders, regardless of maturity.
    Holders(HoldersArgs),
    /// Deadlines and inclusion outlook computed from a first trade date.
    Deadlines(DeadlinesArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Ticker symbol (case-insensitive).
    pub symbol: String,

    #[arg(long, value_enum, default_value_t = SectorSelector::Auto)]
    pub sector: SectorSelector,
}

#[derive(Debug, Args)]
pub struct HoldersArgs {
    /// Ticker symbol (case-insensitive).
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct DeadlinesArgs {
    /// First trade date (YYYY-MM-DD).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub first_trade: String,

    /// Provider-style sector name used for auto-detection, e.g. "Healthcare".
    #[arg(long)]
    pub sector_name: Option<String>,

    /// Industry used for auto-detection, e.g. "Biotechnology".
    #[arg(long)]
    pub industry: Option<String>,

    /// Market capitalization in USD.
    #[arg(long)]
    pub market_cap: Option<f64>,

    #[arg(long, value_enum, default_value_t = SectorSelector::Auto)]
    pub sector: SectorSelector,
}
