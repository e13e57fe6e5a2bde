//! Maps a publication moment to the base trading day of its event window.

use crate::domain::calendar::TradingCalendar;
use crate::domain::news::PublicationTime;
use chrono::NaiveDate;

pub const DEFAULT_CUTOFF_HOUR: u32 = 16;

/// Where an event sits relative to the trading calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAnchor {
    pub publication_date: NaiveDate,
    /// Publication date, moved to the next calendar day for after-close news.
    pub anchor_date: NaiveDate,
    pub after_close: bool,
    /// First trading day on or after `anchor_date`, if the series reaches it.
    pub base_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDayResolver {
    cutoff_hour: u32,
}

impl Default for EventDayResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF_HOUR)
    }
}

impl EventDayResolver {
    pub fn new(cutoff_hour: u32) -> Self {
        Self { cutoff_hour }
    }

    pub fn cutoff_hour(&self) -> u32 {
        self.cutoff_hour
    }

    /// Only the hour is compared: 16:00 and 16:59 are both after a 16h close.
    pub fn is_after_close(&self, published: &PublicationTime) -> bool {
        published.has_time && published.hour >= self.cutoff_hour
    }

    /// Anchor date for `published`, independent of any price data.
    pub fn anchor_date(&self, published: &PublicationTime) -> Option<NaiveDate> {
        if self.is_after_close(published) {
            published.date.succ_opt()
        } else {
            Some(published.date)
        }
    }

    pub fn resolve(
        &self,
        calendar: &TradingCalendar<'_>,
        published: &PublicationTime,
    ) -> Option<EventAnchor> {
        let after_close = self.is_after_close(published);
        let anchor_date = self.anchor_date(published)?;

        let base_day = if !after_close && calendar.exists(anchor_date) {
            Some(anchor_date)
        } else {
            calendar.nearest_on_or_after(anchor_date)
        };

        Some(EventAnchor {
            publication_date: published.date,
            anchor_date,
            after_close,
            base_day,
        })
    }
}
