//! Per-day return metrics derived from raw bars.
//!
//! Computed once per series right after the fetch so every window lookup
//! reads the same values.

use crate::domain::price_bar::PriceBar;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyMetrics {
    /// Close-over-close change. `None` for the first bar of a series.
    pub pct_change_prev_close: Option<f64>,
    /// Close-over-open change within the session. `None` when open is zero.
    pub intraday_pct: Option<f64>,
}

/// Derive metrics for `bars`, which must already be sorted ascending by date.
/// The output is index-aligned with the input.
pub fn compute_daily_metrics(bars: &[PriceBar]) -> Vec<DailyMetrics> {
    let mut out = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        out.push(DailyMetrics {
            pct_change_prev_close: prev_close.and_then(|pc| bar.pct_change_from(pc)),
            intraday_pct: bar.intraday_pct(),
        });
        prev_close = Some(bar.close);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar(day: u32, open: f64, close: f64) -> PriceBar {
        PriceBar {
            ticker: "LWSA3.SA".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1000,
        }
    }

    #[test]
    fn empty_series_yields_no_metrics() {
        assert!(compute_daily_metrics(&[]).is_empty());
    }

    #[test]
    fn first_bar_has_no_previous_close_change() {
        let metrics = compute_daily_metrics(&[bar(1, 10.0, 11.0)]);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].pct_change_prev_close, None);
        assert_relative_eq!(metrics[0].intraday_pct.unwrap(), 0.1);
    }

    #[test]
    fn close_over_close_follows_series_order() {
        let bars = vec![bar(1, 10.0, 10.0), bar(4, 10.0, 12.0), bar(5, 12.0, 9.0)];
        let metrics = compute_daily_metrics(&bars);

        assert_relative_eq!(metrics[1].pct_change_prev_close.unwrap(), 0.2);
        assert_relative_eq!(metrics[2].pct_change_prev_close.unwrap(), -0.25);
        assert_relative_eq!(metrics[2].intraday_pct.unwrap(), -0.25);
    }

    #[test]
    fn zero_open_only_nulls_that_bar() {
        let bars = vec![bar(1, 10.0, 10.0), bar(4, 0.0, 11.0), bar(5, 11.0, 11.0)];
        let metrics = compute_daily_metrics(&bars);

        assert_eq!(metrics[1].intraday_pct, None);
        assert_relative_eq!(metrics[1].pct_change_prev_close.unwrap(), 0.1);
        assert_relative_eq!(metrics[2].intraday_pct.unwrap(), 0.0);
    }

    #[test]
    fn zero_previous_close_nulls_the_change() {
        let bars = vec![bar(1, 1.0, 0.0), bar(4, 1.0, 2.0)];
        let metrics = compute_daily_metrics(&bars);
        assert_eq!(metrics[1].pct_change_prev_close, None);
    }
}
