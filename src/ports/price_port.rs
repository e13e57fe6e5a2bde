//! Price fetch port.

use crate::domain::error::SentipriceError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

/// Supplies daily bars for one ticker over an inclusive date range.
///
/// An empty vector means "no data available", which callers treat as a
/// skipped instrument rather than a failure.
pub trait PricePort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SentipriceError>;
}
