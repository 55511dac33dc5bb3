//! PriceCast CLI: analysis, batch, data generation and journal commands.
//!
//! Commands:
//! - `analyze` - analyze one symbol, print the JSON report, journal and export it
//! - `batch` - analyze many symbols in parallel
//! - `generate` - write the synthetic demo universe as CSV
//! - `symbols` / `info` - list and describe available price files
//! - `journal show|stats|cleanup|export` - inspect the daily journal

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pricecast_core::forecast::Horizon;
use pricecast_runner::export::{journal_csv, report_json, report_markdown, save_reports};
use pricecast_runner::synthetic::DEFAULT_DAYS;
use pricecast_runner::{
    available_symbols, build_advisor, data_info, generate_universe, partition, run_analysis,
    summarize, AdvisedReport, AnalysisRequest, AppConfig, BatchAnalyzer, DateRange, ExportFormat,
    Journal, JournalRecord,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricecast",
    about = "PriceCast: technical indicators, trend, signals and short-horizon forecasts"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./pricecast.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol and print the JSON report.
    Analyze {
        /// Ticker symbol (2-10 letters or digits).
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today when --start or --days is given.
        #[arg(long)]
        end: Option<String>,

        /// Use only the last N calendar days up to --end.
        #[arg(long, conflicts_with = "start")]
        days: Option<u32>,

        /// Forecast horizon in days (1-10). Overrides the config.
        #[arg(long)]
        horizon: Option<usize>,

        /// Skip advice generation.
        #[arg(long, default_value_t = false)]
        no_advice: bool,

        /// Do not append the result to the daily journal.
        #[arg(long, default_value_t = false)]
        no_journal: bool,

        /// Also write the report to the export directory.
        #[arg(long, default_value_t = false)]
        export: bool,

        /// Print a Markdown summary instead of JSON.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
    /// Analyze several symbols in parallel. Defaults to every available file.
    Batch {
        /// Symbols to analyze.
        symbols: Vec<String>,

        /// Forecast horizon in days (1-10). Overrides the config.
        #[arg(long)]
        horizon: Option<usize>,

        /// Export format (json or csv). Overrides the config.
        #[arg(long)]
        format: Option<String>,

        /// Run symbols one after another.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Skip advice generation.
        #[arg(long, default_value_t = false)]
        no_advice: bool,

        /// Do not append results to the daily journal.
        #[arg(long, default_value_t = false)]
        no_journal: bool,
    },
    /// Write synthetic price files for the demo universe.
    Generate {
        /// Number of daily points per symbol.
        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: usize,

        /// Last date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,
    },
    /// List symbols with a price file.
    Symbols,
    /// Summarize the price file of one symbol.
    Info { symbol: String },
    /// Daily journal commands.
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
}

#[derive(Subcommand)]
enum JournalAction {
    /// Print one day's journal.
    Show {
        /// Day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Counts of analyses, signals and trends over recent days.
    Stats {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Delete journal files older than the given number of days.
    Cleanup {
        #[arg(long, default_value_t = 30)]
        keep_days: u32,
    },
    /// Export journal records in a date range as CSV.
    Export {
        /// First day (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// Last day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        to: Option<String>,

        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!(fingerprint = %config.fingerprint(), "configuration loaded");

    match cli.command {
        Commands::Analyze {
            symbol,
            start,
            end,
            days,
            horizon,
            no_advice,
            no_journal,
            export,
            markdown,
        } => {
            let range = resolve_range(start.as_deref(), end.as_deref(), days)?;
            let opts = AnalyzeOptions {
                horizon: resolve_horizon(horizon, &config)?,
                no_advice,
                no_journal,
                export,
                markdown,
            };
            run_analyze(&config, &symbol, range, &opts)
        }
        Commands::Batch {
            symbols,
            horizon,
            format,
            sequential,
            no_advice,
            no_journal,
        } => {
            let horizon = resolve_horizon(horizon, &config)?;
            let format = match format {
                Some(f) => f.parse::<ExportFormat>()?,
                None => config.export_format,
            };
            run_batch(&config, symbols, horizon, format, sequential, no_advice, no_journal)
        }
        Commands::Generate { days, end } => {
            let end = end.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            let paths = generate_universe(&config.data_dir, days, end)?;
            println!(
                "Wrote {} price files to {}",
                paths.len(),
                config.data_dir.display()
            );
            Ok(())
        }
        Commands::Symbols => {
            let symbols = available_symbols(&config.data_dir);
            if symbols.is_empty() {
                println!("No price files in {}", config.data_dir.display());
            }
            for symbol in symbols {
                println!("{symbol}");
            }
            Ok(())
        }
        Commands::Info { symbol } => {
            let info = data_info(&config.data_dir, &symbol)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Commands::Journal { action } => run_journal(&config, action),
    }
}

/// `RUST_LOG` wins; otherwise `--log-level`. Logs go to stderr so stdout stays JSON.
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    days: Option<u32>,
) -> Result<Option<DateRange>> {
    let start = start.map(parse_date).transpose()?;
    let end = end.map(parse_date).transpose()?;

    let range = match (start, end, days) {
        (_, end, Some(days)) => {
            if days == 0 {
                bail!("--days must be positive");
            }
            Some(DateRange::trailing(end.unwrap_or_else(today), days))
        }
        (None, None, None) => None,
        (start, end, None) => Some(DateRange::new(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or_else(today),
        )?),
    };
    Ok(range)
}

fn resolve_horizon(days: Option<usize>, config: &AppConfig) -> Result<Horizon> {
    match days {
        Some(days) => Horizon::new(days).context("invalid --horizon"),
        None => Ok(config.horizon),
    }
}

fn export_stamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

fn journal_reports(config: &AppConfig, reports: &[AdvisedReport]) {
    let journal = Journal::new(config.reports_dir.clone());
    let day = today();
    for report in reports {
        match journal.append(day, JournalRecord::from_report(report)) {
            Ok(outcome) => info!(
                path = %outcome.path.display(),
                today = outcome.total_records_today,
                "journaled"
            ),
            Err(e) => warn!(symbol = report.analysis.symbol(), error = %e, "journal write failed"),
        }
    }
}

struct AnalyzeOptions {
    horizon: Horizon,
    no_advice: bool,
    no_journal: bool,
    export: bool,
    markdown: bool,
}

fn run_analyze(
    config: &AppConfig,
    symbol: &str,
    range: Option<DateRange>,
    opts: &AnalyzeOptions,
) -> Result<()> {
    let advisor = if opts.no_advice {
        None
    } else {
        build_advisor(&config.advice)
    };
    let request = AnalysisRequest {
        symbol: symbol.to_string(),
        range,
        horizon: opts.horizon,
    };
    let report = run_analysis(&config.data_dir, &request, advisor.as_deref(), Utc::now())
        .with_context(|| format!("analysis of '{symbol}' failed"))?;

    if opts.markdown {
        println!("{}", report_markdown(&report));
    } else {
        println!("{}", report_json(&report)?);
    }

    if !opts.no_journal {
        journal_reports(config, std::slice::from_ref(&report));
    }
    if opts.export {
        let path = save_reports(
            std::slice::from_ref(&report),
            &config.export_dir,
            config.export_format,
            &export_stamp(),
        )?;
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

fn run_batch(
    config: &AppConfig,
    symbols: Vec<String>,
    horizon: Horizon,
    format: ExportFormat,
    sequential: bool,
    no_advice: bool,
    no_journal: bool,
) -> Result<()> {
    let symbols = if symbols.is_empty() {
        available_symbols(&config.data_dir)
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!(
            "no price files in {}; run `pricecast generate` first",
            config.data_dir.display()
        );
    }

    let advisor = if no_advice {
        None
    } else {
        build_advisor(&config.advice)
    };
    let outcomes = BatchAnalyzer::new(&config.data_dir, horizon)
        .with_advisor(advisor.as_deref())
        .with_parallelism(!sequential)
        .run(&symbols, Utc::now());

    let summary = summarize(&outcomes);
    let (reports, failures) = partition(outcomes);

    println!(
        "{:<8} {:>10} {:>8} {:<10} {:<5}",
        "SYMBOL", "PRICE", "RSI14", "TREND", "SIGNAL"
    );
    for report in &reports {
        let a = &report.analysis;
        let rsi = a
            .indicators()
            .rsi14
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{:<8} {:>10.2} {:>8} {:<10} {:<5}",
            a.symbol(),
            a.latest_price(),
            rsi,
            a.trend().to_string(),
            a.signal().to_string()
        );
    }
    for (symbol, err) in &failures {
        eprintln!("{symbol}: {err}");
    }
    println!(
        "{} analyzed, {} failed",
        summary.succeeded, summary.failed
    );

    if reports.is_empty() {
        bail!("every symbol failed");
    }
    if !no_journal {
        journal_reports(config, &reports);
    }
    let path = save_reports(&reports, &config.export_dir, format, &export_stamp())?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn run_journal(config: &AppConfig, action: JournalAction) -> Result<()> {
    let journal = Journal::new(config.reports_dir.clone());

    match action {
        JournalAction::Show { date } => {
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            let day = journal.load_day(date)?;
            println!("{}", serde_json::to_string_pretty(&day)?);
        }
        JournalAction::Stats { days } => {
            let stats = journal.statistics(today(), days)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        JournalAction::Cleanup { keep_days } => {
            let deleted = journal.cleanup(today(), keep_days)?;
            println!(
                "Deleted {deleted} journal files older than {keep_days} days from {}",
                journal.dir().display()
            );
        }
        JournalAction::Export { from, to, output } => {
            let from = parse_date(&from)?;
            let to = to.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            let csv = journal_csv(&journal.records_between(from, to)?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{csv}"),
            }
        }
    }
    Ok(())
}
