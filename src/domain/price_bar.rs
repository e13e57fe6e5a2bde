//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// (close - open) / open, undefined when open is not positive.
    pub fn intraday_pct(&self) -> Option<f64> {
        ratio_change(self.open, self.close)
    }

    /// (close - prev_close) / prev_close, undefined when prev_close is not positive.
    pub fn pct_change_from(&self, prev_close: f64) -> Option<f64> {
        ratio_change(prev_close, self.close)
    }
}

fn ratio_change(from: f64, to: f64) -> Option<f64> {
    if from > 0.0 && from.is_finite() && to.is_finite() {
        Some((to - from) / from)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_bar() -> PriceBar {
        PriceBar {
            ticker: "TOTS3.SA".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn intraday_pct() {
        // (105 - 100) / 100
        assert_relative_eq!(sample_bar().intraday_pct().unwrap(), 0.05);
    }

    #[test]
    fn intraday_pct_zero_open_is_undefined() {
        let bar = PriceBar {
            open: 0.0,
            ..sample_bar()
        };
        assert_eq!(bar.intraday_pct(), None);
    }

    #[test]
    fn pct_change_from_previous_close() {
        // (105 - 84) / 84 = 0.25
        assert_relative_eq!(sample_bar().pct_change_from(84.0).unwrap(), 0.25);
    }

    #[test]
    fn pct_change_from_zero_close_is_undefined() {
        assert_eq!(sample_bar().pct_change_from(0.0), None);
    }

    #[test]
    fn nan_prices_are_undefined() {
        let bar = PriceBar {
            close: f64::NAN,
            ..sample_bar()
        };
        assert_eq!(bar.intraday_pct(), None);
    }
}
