//! Trading calendar over one instrument's price series.
//!
//! A trading day is any date that has a bar in the series. All lookups are
//! binary searches over the sorted bars; nothing here does calendar
//! arithmetic except [`TradingCalendar::shift`], which moves by positions.

use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy)]
pub struct TradingCalendar<'a> {
    series: &'a PriceSeries,
}

impl<'a> TradingCalendar<'a> {
    pub fn new(series: &'a PriceSeries) -> Self {
        Self { series }
    }

    pub fn series(&self) -> &'a PriceSeries {
        self.series
    }

    pub fn exists(&self, date: NaiveDate) -> bool {
        self.series.index_of(date).is_some()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.series.index_of(date)
    }

    /// Latest trading day `<= target`.
    pub fn nearest_on_or_before(&self, target: NaiveDate) -> Option<NaiveDate> {
        self.position_on_or_before(target)
            .and_then(|i| self.series.date_at(i))
    }

    /// Earliest trading day `>= target`.
    pub fn nearest_on_or_after(&self, target: NaiveDate) -> Option<NaiveDate> {
        self.series.date_at(self.first_position_not_before(target))
    }

    /// Trading day `offset` sessions away from `base`. `None` when `base`
    /// is not a trading day or the result falls outside the series.
    pub fn shift(&self, base: NaiveDate, offset: i64) -> Option<NaiveDate> {
        let index = self.index_of(base)?;
        let shifted = shift_index(index, offset, self.series.len())?;
        self.series.date_at(shifted)
    }

    pub(crate) fn position_on_or_before(&self, target: NaiveDate) -> Option<usize> {
        self.bars_after(target).checked_sub(1)
    }

    fn first_position_not_before(&self, target: NaiveDate) -> usize {
        self.series.bars().partition_point(|b| b.date < target)
    }

    fn bars_after(&self, target: NaiveDate) -> usize {
        self.series.bars().partition_point(|b| b.date <= target)
    }
}

/// `index + offset` when it lands inside `0..len`.
pub(crate) fn shift_index(index: usize, offset: i64, len: usize) -> Option<usize> {
    let shifted = i64::try_from(index).ok()?.checked_add(offset)?;
    let shifted = usize::try_from(shifted).ok()?;
    (shifted < len).then_some(shifted)
}
