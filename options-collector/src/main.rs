//! Options chain snapshot collector CLI.
//!
//! # Usage
//!
//! ```bash
//! # Collect every 3 minutes while the market is open
//! options-collector run --config config/default.toml
//!
//! # One cycle now, ignoring the session calendar
//! options-collector once --force
//!
//! # Is the market open, and which holidays are observed this year?
//! options-collector session --at 2025-07-03T10:00:00-04:00
//!
//! # Summarize the collection log
//! options-collector inspect
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike};
use clap::{Parser, Subcommand};
use tracing::info;

use options_collector::calendar::holidays;
use options_collector::collector::{Collector, CycleOutcome, Scheduler};
use options_collector::config::CollectorConfig;
use options_collector::data::GatewayClient;
use options_collector::writer::inspect_log;

const SEPARATOR: &str = "============================================================";

/// Options chain snapshot collector CLI.
#[derive(Parser)]
#[command(name = "options-collector")]
#[command(about = "Collect periodic options chain snapshots into CSV")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Underlying symbol; also used as the option trading class
    #[arg(long, global = true)]
    symbol: Option<String>,

    /// Minutes between cycles
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Cumulative collection log
    #[arg(long, global = true)]
    log_path: Option<PathBuf>,

    /// Latest snapshot file
    #[arg(long, global = true)]
    latest_path: Option<PathBuf>,

    /// Broker gateway base URL
    #[arg(long, global = true)]
    gateway: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run collection cycles until interrupted
    Run,

    /// Run a single collection cycle
    Once {
        /// Collect even when the market is closed
        #[arg(long)]
        force: bool,
    },

    /// Show the session gate status and the year's holidays
    Session {
        /// Instant to check (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Summarize the collection log
    Inspect {
        /// Log to inspect; defaults to the configured log path
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    fn load_config(&self) -> Result<CollectorConfig> {
        let mut config = CollectorConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(symbol) = &self.symbol {
            config.contract.symbol = symbol.clone();
            config.contract.trading_class = symbol.clone();
        }
        if let Some(minutes) = self.interval {
            config.schedule.interval_minutes = minutes;
        }
        if let Some(path) = &self.log_path {
            config.output.log_path = path.clone();
        }
        if let Some(path) = &self.latest_path {
            config.output.latest_path = path.clone();
        }
        if let Some(url) = &self.gateway {
            config.gateway.base_url = url.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

async fn cmd_run(config: &CollectorConfig) -> Result<()> {
    let collector = Collector::from_config(config)?;
    let mut client = GatewayClient::new(&config.gateway).context("Failed to build gateway client")?;
    let scheduler = Scheduler::from_minutes(config.schedule.interval_minutes);
    let calendar = *collector.calendar();

    info!(
        symbol = %config.contract.symbol,
        interval_minutes = config.schedule.interval_minutes,
        log = %config.output.log_path.display(),
        "starting collector"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let stats = scheduler
        .run(&collector, &mut client, || calendar.now(), shutdown)
        .await;

    println!("\n{}", SEPARATOR);
    println!("COLLECTION SUMMARY");
    println!("{}", SEPARATOR);
    println!("Cycles:     {}", stats.cycles);
    println!("Persisted:  {}", stats.persisted);
    println!("No data:    {}", stats.no_data);
    println!("Skipped:    {}", stats.skipped);
    println!("Failed:     {}", stats.failed);
    println!("Rejected:   {} tickers (partial greeks)", stats.rejected);
    println!("Requests:   {}", client.request_count());

    Ok(())
}

async fn cmd_once(config: &CollectorConfig, force: bool) -> Result<()> {
    let collector = Collector::from_config(config)?;
    let mut client = GatewayClient::new(&config.gateway).context("Failed to build gateway client")?;
    let now = collector.calendar().now();

    let outcome = if force {
        collector.collect(&mut client, now).await
    } else {
        collector.run_cycle(&mut client, now).await
    }
    .context("Collection cycle failed")?;

    match outcome {
        CycleOutcome::Skipped(status) => println!("Skipped: {}", status),
        CycleOutcome::NoData(stage) => println!("No data collected ({:?})", stage),
        CycleOutcome::Persisted(report) => {
            println!("Reference price: {}", report.reference_price);
            println!(
                "Contracts:       {} qualified of {} candidates",
                report.qualified, report.candidates
            );
            println!("Rejected:        {} tickers (partial greeks)", report.rejected);
            println!("Rows written:    {}", report.rows);
            if report.log_created {
                println!("Created {}", config.output.log_path.display());
            }
        }
    }

    Ok(())
}

fn cmd_session(config: &CollectorConfig, at: Option<String>) -> Result<()> {
    let calendar = config.session.calendar()?;
    let now = match at {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .with_context(|| format!("Invalid RFC 3339 timestamp: {}", s))?
            .with_timezone(&calendar.timezone()),
        None => calendar.now(),
    };

    println!("{}", SEPARATOR);
    println!("{}  {}", now.format("%Y-%m-%d %H:%M:%S %Z"), calendar.session_status(&now));
    println!("{}", SEPARATOR);
    println!("Holidays {}:", now.year());
    for holiday in holidays(now.year()) {
        if holiday.observed == holiday.date {
            println!("  {}  {}", holiday.observed, holiday.name);
        } else {
            println!(
                "  {}  {} (observed, falls on {})",
                holiday.observed, holiday.name, holiday.date
            );
        }
    }

    Ok(())
}

fn cmd_inspect(config: &CollectorConfig, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| config.output.log_path.clone());
    let summary =
        inspect_log(&path).with_context(|| format!("Failed to inspect {}", path.display()))?;

    println!("{}", SEPARATOR);
    println!("LOG: {}", path.display());
    println!("{}", SEPARATOR);
    println!("Rows:     {}", summary.rows);
    println!("Columns:  {}", summary.header.len());
    if summary.header_matches {
        println!("Header:   current schema");
    } else {
        println!("Header:   differs from current schema");
        let missing = summary.missing_columns();
        if !missing.is_empty() {
            println!("Missing:  {}", missing.join(", "));
        }
    }
    if let Some(cycles) = summary.cycles {
        println!("Cycles:   {}", cycles);
    }
    if let (Some(first), Some(last)) = (&summary.first_timestamp, &summary.last_timestamp) {
        println!("Range:    {} .. {}", first, last);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("options_collector=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Commands::Run => cmd_run(&config).await?,
        Commands::Once { force } => cmd_once(&config, force).await?,
        Commands::Session { at } => cmd_session(&config, at)?,
        Commands::Inspect { path } => cmd_inspect(&config, path)?,
    }

    Ok(())
}
