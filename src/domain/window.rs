//! Event window extraction.
//!
//! Two strategies share one output shape:
//!
//! - [`WindowStrategy::TradingDay`]: offsets are positions in the trading
//!   calendar relative to the base day. An offset outside the series is null.
//! - [`WindowStrategy::CalendarCarryForward`]: offsets are civil days added to
//!   the base day; each resolves to the latest bar on or before it, and
//!   `no_session` records whether the target date itself traded.
//!
//! Every window carries one slot per offset in `-before..=after`, resolved
//! or not, so downstream tables keep a stable column set.

use crate::domain::calendar::{shift_index, TradingCalendar};
use crate::domain::price_series::PriceSeries;
use crate::domain::resolver::EventAnchor;
use chrono::NaiveDate;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowStrategy {
    #[default]
    TradingDay,
    CalendarCarryForward,
}

impl fmt::Display for WindowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStrategy::TradingDay => write!(f, "trading_day"),
            WindowStrategy::CalendarCarryForward => write!(f, "calendar_carry_forward"),
        }
    }
}

impl FromStr for WindowStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "trading_day" | "trading" => Ok(WindowStrategy::TradingDay),
            "calendar_carry_forward" | "calendar" => Ok(WindowStrategy::CalendarCarryForward),
            other => Err(format!(
                "unknown window strategy '{other}' (expected trading_day or calendar_carry_forward)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub before: u32,
    pub after: u32,
    pub strategy: WindowStrategy,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            before: 2,
            after: 2,
            strategy: WindowStrategy::TradingDay,
        }
    }
}

impl WindowSpec {
    pub fn offsets(&self) -> RangeInclusive<i64> {
        -i64::from(self.before)..=i64::from(self.after)
    }

    pub fn width(&self) -> usize {
        let width = u64::from(self.before) + u64::from(self.after) + 1;
        usize::try_from(width).unwrap_or(usize::MAX)
    }

    pub fn labels(&self) -> Vec<String> {
        self.offsets().map(offset_label).collect()
    }
}

/// Column prefix for an offset. The sign is always explicit, so zero is `d+0`.
pub fn offset_label(offset: i64) -> String {
    format!("d{offset:+}")
}

/// One offset of a window. All fields are `None` when unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetSlot {
    pub offset: i64,
    /// Date of the session whose prices fill this slot.
    pub date: Option<NaiveDate>,
    /// Civil date the offset projected to (carry-forward only).
    pub target_date: Option<NaiveDate>,
    pub no_session: Option<bool>,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub pct_change_prev_close: Option<f64>,
    pub intraday_pct: Option<f64>,
}

impl OffsetSlot {
    pub fn empty(offset: i64) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.date.is_some()
    }

    fn from_bar(offset: i64, series: &PriceSeries, index: usize) -> Self {
        let bar = &series.bars()[index];
        let metrics = series.metrics_at(index).copied().unwrap_or_default();
        Self {
            offset,
            date: Some(bar.date),
            target_date: None,
            no_session: Some(false),
            open: Some(bar.open),
            close: Some(bar.close),
            pct_change_prev_close: metrics.pct_change_prev_close,
            intraday_pct: metrics.intraday_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Resolved,
    UnparsableTimestamp,
    UnknownTicker,
    NoPriceData,
    /// The series does not reach the event's base day.
    BeyondSeries,
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WindowStatus::Resolved => "resolved",
            WindowStatus::UnparsableTimestamp => "unparsable_timestamp",
            WindowStatus::UnknownTicker => "unknown_ticker",
            WindowStatus::NoPriceData => "no_price_data",
            WindowStatus::BeyondSeries => "beyond_series",
        };
        write!(f, "{s}")
    }
}

/// The enriched record emitted for every input news event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWindow {
    pub company: String,
    pub ticker: Option<String>,
    pub title: String,
    pub url: String,
    pub published_at: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub base_day: Option<NaiveDate>,
    pub after_close: Option<bool>,
    pub status: WindowStatus,
    pub slots: Vec<OffsetSlot>,
}

impl EventWindow {
    pub fn slot(&self, offset: i64) -> Option<&OffsetSlot> {
        self.slots.iter().find(|s| s.offset == offset)
    }

    pub fn has_data(&self) -> bool {
        self.slots.iter().any(OffsetSlot::is_resolved)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowExtractor {
    spec: WindowSpec,
}

impl WindowExtractor {
    pub fn new(spec: WindowSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    pub fn empty_slots(&self) -> Vec<OffsetSlot> {
        self.spec.offsets().map(OffsetSlot::empty).collect()
    }

    /// Slots for one anchored event, always `spec.width()` long. Both
    /// strategies count offsets from the base day; without one every slot
    /// is null.
    pub fn extract(&self, calendar: &TradingCalendar<'_>, anchor: &EventAnchor) -> Vec<OffsetSlot> {
        let Some(base) = anchor.base_day else {
            return self.empty_slots();
        };
        match self.spec.strategy {
            WindowStrategy::TradingDay => self.trading_day_slots(calendar, base),
            WindowStrategy::CalendarCarryForward => self.carry_forward_slots(calendar, base),
        }
    }

    fn trading_day_slots(
        &self,
        calendar: &TradingCalendar<'_>,
        base: NaiveDate,
    ) -> Vec<OffsetSlot> {
        let series = calendar.series();
        let Some(base_index) = calendar.index_of(base) else {
            return self.empty_slots();
        };

        self.spec
            .offsets()
            .map(|offset| match shift_index(base_index, offset, series.len()) {
                Some(i) => OffsetSlot::from_bar(offset, series, i),
                None => OffsetSlot::empty(offset),
            })
            .collect()
    }

    fn carry_forward_slots(
        &self,
        calendar: &TradingCalendar<'_>,
        base: NaiveDate,
    ) -> Vec<OffsetSlot> {
        let series = calendar.series();
        self.spec
            .offsets()
            .map(|offset| {
                let Some(target) = base.checked_add_signed(chrono::Duration::days(offset))
                else {
                    return OffsetSlot::empty(offset);
                };
                match calendar.position_on_or_before(target) {
                    Some(i) => OffsetSlot {
                        target_date: Some(target),
                        no_session: Some(!calendar.exists(target)),
                        ..OffsetSlot::from_bar(offset, series, i)
                    },
                    None => OffsetSlot {
                        target_date: Some(target),
                        ..OffsetSlot::empty(offset)
                    },
                }
            })
            .collect()
    }
}
