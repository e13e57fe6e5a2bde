//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_news_adapter::JsonNewsAdapter;
use crate::adapters::lexicon_sentiment_adapter::LexiconSentimentAdapter;
use crate::domain::config::{build_analysis_config, AnalysisConfig};
use crate::domain::correlation::{rank, summarize, CorrelationOrdering, CorrelationSettings};
use crate::domain::error::SentipriceError;
use crate::domain::news::NewsEvent;
use crate::domain::pipeline::{filter_news, run_analysis, run_windows, AnalysisOutcome, WindowRun};
use crate::domain::sentiment::{SentimentSummary, SentimentVariant};
use crate::domain::table::WindowTable;
use crate::domain::window::WindowStrategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::news_port::NewsPort;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_WINDOWS_FILE: &str = "windows.csv";
pub const DEFAULT_CORRELATIONS_FILE: &str = "correlations.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(
    name = "sentiprice",
    version,
    about = "Align news events with stock price windows and correlate sentiment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract a price window around every news event
    Windows {
        #[arg(short, long)]
        config: PathBuf,
        /// News JSON file, overrides [news] path
        #[arg(long)]
        news: Option<PathBuf>,
        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// trading_day or calendar_carry_forward
        #[arg(long)]
        strategy: Option<WindowStrategy>,
    },
    /// Extract windows, score sentiment and correlate
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        news: Option<PathBuf>,
        /// Output directory for windows.csv and correlations.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        strategy: Option<WindowStrategy>,
        /// magnitude or signed
        #[arg(long)]
        ordering: Option<CorrelationOrdering>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub news: Option<PathBuf>,
    pub strategy: Option<WindowStrategy>,
    pub ordering: Option<CorrelationOrdering>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Windows {
            config,
            news,
            output,
            strategy,
        } => {
            let overrides = Overrides {
                news,
                strategy,
                ordering: None,
            };
            run_windows_command(&config, &overrides, output.as_deref())
        }
        Command::Analyze {
            config,
            news,
            output,
            strategy,
            ordering,
        } => {
            let overrides = Overrides {
                news,
                strategy,
                ordering,
            };
            run_analyze_command(&config, &overrides, output.as_deref())
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SentipriceError> {
    FileConfigAdapter::from_file(path).map_err(|e| SentipriceError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_config(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<AnalysisConfig, SentipriceError> {
    let mut config = build_analysis_config(adapter)?;
    if let Some(strategy) = overrides.strategy {
        config.window.strategy = strategy;
    }
    if let Some(ordering) = overrides.ordering {
        config.correlation.ordering = ordering;
    }
    if let Some(news) = &overrides.news {
        config.news.path = Some(news.clone());
    }
    Ok(config)
}

pub fn news_path(config: &AnalysisConfig) -> Result<&Path, SentipriceError> {
    config
        .news
        .path
        .as_deref()
        .ok_or_else(|| SentipriceError::ConfigMissing {
            section: "news".into(),
            key: "path".into(),
        })
}

/// Load, filter and align news. Fails only when there is nothing to process.
pub fn extract_windows(
    price_port: &dyn PricePort,
    news_port: &dyn NewsPort,
    config: &AnalysisConfig,
) -> Result<(Vec<NewsEvent>, WindowRun), SentipriceError> {
    let events = filter_news(news_port.load_news()?, config);
    if events.is_empty() {
        return Err(SentipriceError::NoData {
            what: "news input is empty after filtering".into(),
        });
    }
    let run = run_windows(price_port, &events, config);
    Ok((events, run))
}

fn load_run_config(
    config_path: &Path,
    overrides: &Overrides,
) -> Result<AnalysisConfig, SentipriceError> {
    tracing::info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    build_config(&adapter, overrides)
}

fn run_windows_command(
    config_path: &Path,
    overrides: &Overrides,
    output: Option<&Path>,
) -> Result<(), SentipriceError> {
    let config = load_run_config(config_path, overrides)?;
    let news = JsonNewsAdapter::new(news_path(&config)?);
    let prices = CsvPriceAdapter::new(&config.price_dir);

    let (_, run) = extract_windows(&prices, &news, &config)?;

    let output = output.unwrap_or_else(|| Path::new(DEFAULT_WINDOWS_FILE));
    let table = WindowTable::build(&run.windows, &config.window);
    CsvReportAdapter::new(config.delimiter).write_windows(&table, output)?;

    eprint!("{}", run_summary(&run));
    Ok(())
}

fn run_analyze_command(
    config_path: &Path,
    overrides: &Overrides,
    output: Option<&Path>,
) -> Result<(), SentipriceError> {
    let config = load_run_config(config_path, overrides)?;
    let news = JsonNewsAdapter::new(news_path(&config)?);
    let prices = CsvPriceAdapter::new(&config.price_dir);

    let (events, run) = extract_windows(&prices, &news, &config)?;
    let sentiment = LexiconSentimentAdapter::new();
    let outcome = run_analysis(&sentiment, &events, &run.windows, &config);

    let out_dir = output.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
    let report = CsvReportAdapter::new(config.delimiter);
    let table = WindowTable::build(&run.windows, &config.window).with_sentiment(&outcome.scores);
    report.write_windows(&table, &out_dir.join(DEFAULT_WINDOWS_FILE))?;
    report.write_correlations(
        &outcome.correlations,
        &out_dir.join(DEFAULT_CORRELATIONS_FILE),
    )?;

    eprint!("{}", run_summary(&run));
    eprint!("{}", analysis_summary(&outcome, &config.correlation));
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SentipriceError> {
    let adapter = load_config(config_path)?;
    let config = build_config(&adapter, &Overrides::default())?;
    eprintln!("Configuration is valid.");
    eprint!("{}", config_summary(&config));
    Ok(())
}

pub fn config_summary(config: &AnalysisConfig) -> String {
    let mut lines = vec![
        format!("  tickers:   {}", config.tickers.len()),
        format!(
            "  window:    -{}..+{} ({})",
            config.window.before, config.window.after, config.window.strategy
        ),
        format!("  cutoff:    {}h", config.cutoff_hour),
        format!("  buffer:    {} days", config.buffer_days),
    ];
    if let Some(tz) = config.market_timezone {
        lines.push(format!("  timezone:  {tz}"));
    }
    lines.push(format!("  prices:    {}", config.price_dir.display()));
    join_lines(lines)
}

pub fn run_summary(run: &WindowRun) -> String {
    let mut lines = vec![format!(
        "Events: {} ({} resolved)",
        run.windows.len(),
        run.resolved()
    )];
    lines.extend(run.skipped.iter().map(|skipped| {
        format!(
            "  skipped {} ({}): {}",
            skipped.company, skipped.ticker, skipped.reason
        )
    }));
    join_lines(lines)
}

pub fn analysis_summary(outcome: &AnalysisOutcome, settings: &CorrelationSettings) -> String {
    let mut lines = Vec::new();

    for variant in SentimentVariant::ALL {
        let scores: Vec<f64> = outcome.scores.iter().map(|s| s.get(variant)).collect();
        if let Some(s) = SentimentSummary::compute(&scores) {
            lines.push(format!(
                "Sentiment ({variant}): mean {:.2}, range {:.2}..{:.2}, +{} -{} ={}",
                s.mean, s.min, s.max, s.positive, s.negative, s.neutral
            ));
        }
    }

    lines.push(format!(
        "Correlations: {} computed over {} windows ({})",
        outcome.correlations.len(),
        outcome.joined,
        settings.metric
    ));
    for summary in summarize(&outcome.correlations) {
        lines.push(match summary.mean_r {
            Some(mean) => format!(
                "  {}: mean r {:+.3}, {} of {} significant at {}",
                summary.variant,
                mean,
                summary.significant,
                summary.computed,
                settings.significance
            ),
            None => format!("  {}: not enough samples", summary.variant),
        });
    }

    let top = rank(&outcome.correlations, settings.ordering, settings.top_n);
    if !top.is_empty() {
        lines.push(format!("Top {} by {}:", top.len(), settings.ordering));
        lines.extend(top.into_iter().map(|r| {
            format!(
                "  {:<12} {:<5} r={:+.3} p={:.4} n={}{}",
                r.variant.to_string(),
                r.label(),
                r.r,
                r.p_value,
                r.n,
                if r.significant { " *" } else { "" }
            )
        }));
    }
    join_lines(lines)
}

/// One line per entry, each newline-terminated.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}
