//! One instrument's ordered, deduplicated daily bars plus their derived metrics.

use crate::domain::daily_metrics::{compute_daily_metrics, DailyMetrics};
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Immutable after construction. Bars are sorted ascending by date with no
/// repeated dates, and `metrics[i]` belongs to `bars[i]`.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
    metrics: Vec<DailyMetrics>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Sorts, drops repeated dates (first occurrence wins) and computes the
    /// daily metrics in one pass.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date);
        let ticker = ticker.into();
        if bars.len() != before {
            tracing::debug!(
                ticker = %ticker,
                dropped = before - bars.len(),
                "dropped bars with repeated dates"
            );
        }

        let metrics = compute_daily_metrics(&bars);
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();

        Self {
            ticker,
            bars,
            metrics,
            date_index,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn bar_at(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn metrics_at(&self, index: usize) -> Option<&DailyMetrics> {
        self.metrics.get(index)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.index_of(date).map(|i| &self.bars[i])
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.bars.get(index).map(|b| b.date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
