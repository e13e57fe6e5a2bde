//! Analysis configuration: defaults, parsing and validation.
//!
//! Every run parameter lives in [`AnalysisConfig`], built once from a
//! [`ConfigPort`] and passed down explicitly.

use crate::domain::correlation::{
    CorrelationOrdering, CorrelationSettings, PriceMetric, MIN_SAMPLES,
};
use crate::domain::error::SentipriceError;
use crate::domain::resolver::DEFAULT_CUTOFF_HOUR;
use crate::domain::ticker_map::TickerMap;
use crate::domain::window::{WindowSpec, WindowStrategy};
use crate::ports::config_port::ConfigPort;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BEFORE: u32 = 2;
pub const DEFAULT_AFTER: u32 = 2;
pub const DEFAULT_BUFFER_DAYS: u32 = 7;
pub const DEFAULT_DELIMITER: u8 = b';';
/// Upper bound for `before`, `after` and `buffer_days`.
pub const MAX_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsSettings {
    pub path: Option<PathBuf>,
    pub max_per_company: Option<usize>,
    pub require_mention: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub window: WindowSpec,
    /// Extra calendar days fetched on each side of the window.
    pub buffer_days: u32,
    pub cutoff_hour: u32,
    pub market_timezone: Option<Tz>,
    pub tickers: TickerMap,
    pub price_dir: PathBuf,
    pub news: NewsSettings,
    pub correlation: CorrelationSettings,
    pub delimiter: u8,
}

impl AnalysisConfig {
    /// Defaults for everything except the instrument universe and data dir.
    pub fn with_tickers(tickers: TickerMap, price_dir: impl Into<PathBuf>) -> Self {
        Self {
            window: WindowSpec::default(),
            buffer_days: DEFAULT_BUFFER_DAYS,
            cutoff_hour: DEFAULT_CUTOFF_HOUR,
            market_timezone: None,
            tickers,
            price_dir: price_dir.into(),
            news: NewsSettings::default(),
            correlation: CorrelationSettings::default(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, SentipriceError> {
    let window = WindowSpec {
        before: day_count(config, "before", DEFAULT_BEFORE)?,
        after: day_count(config, "after", DEFAULT_AFTER)?,
        strategy: parsed(config, "analysis", "strategy", WindowStrategy::default())?,
    };

    Ok(AnalysisConfig {
        window,
        buffer_days: day_count(config, "buffer_days", DEFAULT_BUFFER_DAYS)?,
        cutoff_hour: build_cutoff_hour(config)?,
        market_timezone: build_timezone(config)?,
        tickers: build_tickers(config)?,
        price_dir: build_price_dir(config)?,
        news: build_news_settings(config)?,
        correlation: build_correlation_settings(config)?,
        delimiter: build_delimiter(config)?,
    })
}

fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, SentipriceError> {
    config
        .get_int(section, key)
        .map_err(|reason| SentipriceError::invalid(section, key, reason))
}

fn day_count(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, SentipriceError> {
    match int_value(config, "analysis", key)? {
        None => Ok(default),
        Some(v) => u32::try_from(v)
            .ok()
            .filter(|&days| days <= MAX_WINDOW_DAYS)
            .ok_or_else(|| {
                SentipriceError::invalid(
                    "analysis",
                    key,
                    format!("{key} must be between 0 and {MAX_WINDOW_DAYS}"),
                )
            }),
    }
}

fn parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SentipriceError>
where
    T: FromStr<Err = String>,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|reason| SentipriceError::invalid(section, key, reason)),
    }
}

fn build_cutoff_hour(config: &dyn ConfigPort) -> Result<u32, SentipriceError> {
    match int_value(config, "analysis", "cutoff_hour")? {
        None => Ok(DEFAULT_CUTOFF_HOUR),
        Some(h @ 0..=23) => Ok(h as u32),
        Some(_) => Err(SentipriceError::invalid(
            "analysis",
            "cutoff_hour",
            "cutoff_hour must be between 0 and 23",
        )),
    }
}

fn build_timezone(config: &dyn ConfigPort) -> Result<Option<Tz>, SentipriceError> {
    config
        .get_string("analysis", "market_timezone")
        .map(|name| {
            name.parse::<Tz>().map_err(|_| {
                SentipriceError::invalid(
                    "analysis",
                    "market_timezone",
                    format!("unknown timezone '{name}'"),
                )
            })
        })
        .transpose()
}

fn build_tickers(config: &dyn ConfigPort) -> Result<TickerMap, SentipriceError> {
    let raw = config
        .get_string("universe", "tickers")
        .ok_or_else(|| SentipriceError::ConfigMissing {
            section: "universe".to_string(),
            key: "tickers".to_string(),
        })?;
    TickerMap::parse(&raw)
        .map_err(|e| SentipriceError::invalid("universe", "tickers", e.to_string()))
}

fn build_price_dir(config: &dyn ConfigPort) -> Result<PathBuf, SentipriceError> {
    config
        .get_string("data", "price_dir")
        .map(PathBuf::from)
        .ok_or_else(|| SentipriceError::ConfigMissing {
            section: "data".to_string(),
            key: "price_dir".to_string(),
        })
}

fn build_news_settings(config: &dyn ConfigPort) -> Result<NewsSettings, SentipriceError> {
    let max_per_company = match int_value(config, "news", "max_per_company")? {
        None => None,
        Some(v) if v > 0 => Some(v as usize),
        Some(_) => {
            return Err(SentipriceError::invalid(
                "news",
                "max_per_company",
                "max_per_company must be positive",
            ));
        }
    };
    let require_mention = config
        .get_bool("news", "require_mention")
        .map_err(|reason| SentipriceError::invalid("news", "require_mention", reason))?
        .unwrap_or(false);

    Ok(NewsSettings {
        path: config.get_string("news", "path").map(PathBuf::from),
        max_per_company,
        require_mention,
    })
}

fn build_correlation_settings(
    config: &dyn ConfigPort,
) -> Result<CorrelationSettings, SentipriceError> {
    let defaults = CorrelationSettings::default();

    let min_samples = match int_value(config, "correlation", "min_samples")? {
        None => defaults.min_samples,
        Some(v) if v >= MIN_SAMPLES as i64 => v as usize,
        Some(_) => {
            return Err(SentipriceError::invalid(
                "correlation",
                "min_samples",
                format!("min_samples must be at least {MIN_SAMPLES}"),
            ));
        }
    };

    let significance = match config
        .get_double("correlation", "significance")
        .map_err(|reason| SentipriceError::invalid("correlation", "significance", reason))?
    {
        None => defaults.significance,
        Some(v) if v > 0.0 && v < 1.0 => v,
        Some(_) => {
            return Err(SentipriceError::invalid(
                "correlation",
                "significance",
                "significance must be between 0 and 1 (exclusive)",
            ));
        }
    };

    let top_n = match int_value(config, "correlation", "top_n")? {
        None => defaults.top_n,
        Some(v) if v > 0 => v as usize,
        Some(_) => {
            return Err(SentipriceError::invalid(
                "correlation",
                "top_n",
                "top_n must be positive",
            ));
        }
    };

    Ok(CorrelationSettings {
        min_samples,
        significance,
        metric: parsed(config, "correlation", "metric", PriceMetric::default())?,
        ordering: parsed(config, "correlation", "ordering", CorrelationOrdering::default())?,
        top_n,
    })
}

fn build_delimiter(config: &dyn ConfigPort) -> Result<u8, SentipriceError> {
    let Some(raw) = config.get_string("output", "delimiter") else {
        return Ok(DEFAULT_DELIMITER);
    };
    let raw = match raw.as_str() {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(SentipriceError::invalid(
            "output",
            "delimiter",
            "delimiter must be a single ASCII character",
        )),
    }
}
