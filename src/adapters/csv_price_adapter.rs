//! CSV file price adapter.
//!
//! One file per ticker, `<dir>/<TICKER>.csv`, with a header row. Column
//! names are matched case-insensitively in the common export spellings
//! (`date`/`Date`, `close`/`Close`, ...). Extra columns are ignored.

use crate::domain::error::SentipriceError;
use crate::domain::price_bar::PriceBar;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<String>,
}

impl CsvPriceAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }
}

fn parse_volume(raw: Option<&str>) -> Result<i64, SentipriceError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(0);
    };
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .ok_or_else(|| SentipriceError::PriceData {
            reason: format!("invalid volume value: {raw}"),
        })
}

impl PricePort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SentipriceError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| SentipriceError::PriceData {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.deserialize::<PriceRow>() {
            let row = result.map_err(|e| SentipriceError::PriceData {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                SentipriceError::PriceData {
                    reason: format!("invalid date '{}': {}", row.date, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(PriceBar {
                ticker: ticker.to_string(),
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: parse_volume(row.volume.as_deref())?,
            });
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(ticker, bars = bars.len(), path = %path.display(), "prices read");
        Ok(bars)
    }
}
