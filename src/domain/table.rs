//! Flat tabular rendering of event windows.
//!
//! One row per window. `None` renders as an empty cell.

use crate::domain::sentiment::{SentimentScores, SentimentVariant};
use crate::domain::window::{offset_label, EventWindow, OffsetSlot, WindowSpec};
use chrono::NaiveDate;

pub const BASE_HEADERS: [&str; 9] = [
    "company",
    "ticker",
    "title",
    "url",
    "published_at",
    "publication_date",
    "base_day",
    "after_close",
    "status",
];

pub const SLOT_FIELDS: [&str; 6] = [
    "date",
    "open",
    "close",
    "pct_change_prev_close",
    "intraday_pct",
    "no_session",
];

#[derive(Debug, Clone, PartialEq)]
pub struct WindowTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl WindowTable {
    pub fn build(windows: &[EventWindow], spec: &WindowSpec) -> Self {
        let headers = headers_for(spec);
        let rows = windows.iter().map(|w| row_for(w, spec)).collect();
        Self { headers, rows }
    }

    /// Append one `sentiment_<variant>` column per variant. `scores` is
    /// aligned with the rows; missing entries render empty.
    pub fn with_sentiment(mut self, scores: &[SentimentScores]) -> Self {
        for variant in SentimentVariant::ALL {
            self.headers.push(format!("sentiment_{variant}"));
        }
        for (i, row) in self.rows.iter_mut().enumerate() {
            let s = scores.get(i);
            for variant in SentimentVariant::ALL {
                row.push(fmt_f64(s.map(|s| s.get(variant))));
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by header name, for tests and summaries.
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

pub fn headers_for(spec: &WindowSpec) -> Vec<String> {
    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    for offset in spec.offsets() {
        let prefix = offset_label(offset);
        headers.extend(SLOT_FIELDS.iter().map(|f| format!("{prefix}_{f}")));
    }
    headers
}

fn row_for(window: &EventWindow, spec: &WindowSpec) -> Vec<String> {
    let mut row = vec![
        window.company.clone(),
        window.ticker.clone().unwrap_or_default(),
        window.title.clone(),
        window.url.clone(),
        window.published_at.clone().unwrap_or_default(),
        fmt_date(window.publication_date),
        fmt_date(window.base_day),
        fmt_bool(window.after_close),
        window.status.to_string(),
    ];
    for offset in spec.offsets() {
        match window.slot(offset) {
            Some(slot) => push_slot(&mut row, slot),
            None => row.extend(std::iter::repeat_n(String::new(), SLOT_FIELDS.len())),
        }
    }
    row
}

fn push_slot(row: &mut Vec<String>, slot: &OffsetSlot) {
    row.push(fmt_date(slot.date));
    row.push(fmt_f64(slot.open));
    row.push(fmt_f64(slot.close));
    row.push(fmt_f64(slot.pct_change_prev_close));
    row.push(fmt_f64(slot.intraday_pct));
    row.push(fmt_bool(slot.no_session));
}

fn fmt_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn fmt_f64(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_bool(v: Option<bool>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}
