//! PEG Scan - Forward PEG of large-cap index funds.
//!
//! Reads the fund page list, extracts each fund's holdings, prices every
//! holding through the market-data provider and prints one weighted PEG per
//! fund plus their average.

use anyhow::{Context, Result};
use clap::Parser;
use peg_common::config::{Config, FundErrorPolicy, OutputFormat};
use peg_common::logging::init_logging;
use std::path::PathBuf;

use peg_scan::{report, FundAggregator, RatioCache, SourceList};

#[derive(Parser, Debug)]
#[command(name = "peg-scan")]
#[command(version)]
#[command(about = "Weighted Forward PEG for large-cap index funds", long_about = None)]
struct Cli {
    /// Config file (default: ~/.pegscan/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source list file, one page address per line
    #[arg(short, long)]
    sources: Option<PathBuf>,

    /// Case-insensitive token selecting funds from the source list
    #[arg(short, long)]
    filter: Option<String>,

    /// What to do when a fund page cannot be processed (abort, skip)
    #[arg(long)]
    on_error: Option<FundErrorPolicy>,

    /// Output format (text, json)
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(sources) = self.sources {
            config.sources.file = sources;
        }
        if let Some(filter) = self.filter {
            config.sources.fund_filter = filter;
        }
        if let Some(policy) = self.on_error {
            config.analysis.on_fund_error = policy;
        }
        if let Some(format) = self.format {
            config.analysis.output = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load_with_env(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("PEG Scan v{}", env!("CARGO_PKG_VERSION"));

    let sources = SourceList::load(&config.sources.file)?;
    let aggregator = FundAggregator::from_config(&config);
    let mut cache = RatioCache::new();

    let peg_report = aggregator
        .run(&sources, &mut cache)
        .await
        .context("PEG analysis aborted")?;

    print!("{}", report::render(&peg_report, config.analysis.output)?);
    Ok(())
}
