//! News records and publication timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use std::collections::HashMap;

/// A news item as supplied upstream. Read-only for the rest of the crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsEvent {
    pub company: String,
    pub title: String,
    pub url: String,
    /// Raw publication timestamp exactly as supplied.
    pub published_at: Option<String>,
    pub body: String,
    /// Tokens produced by an upstream text-cleaning stage, if any.
    pub preprocessed_tokens: Option<Vec<String>>,
}

/// Publication moment reduced to what the resolver needs: the local
/// calendar date and the hour of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationTime {
    pub date: NaiveDate,
    pub hour: u32,
    /// False for date-only inputs, which are read as midnight.
    pub has_time: bool,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw publication timestamp.
///
/// Offset-bearing timestamps are moved into `market_tz` when one is given,
/// otherwise their own wall clock is used. Naive timestamps are taken as
/// market-local. Returns `None` for anything unparsable.
pub fn parse_published(raw: &str, market_tz: Option<Tz>) -> Option<PublicationTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let local = match market_tz {
            Some(tz) => dt.with_timezone(&tz).naive_local(),
            None => dt.naive_local(),
        };
        return Some(from_naive(local));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(from_naive(ndt));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| PublicationTime {
            date,
            hour: 0,
            has_time: false,
        })
}

fn from_naive(ndt: NaiveDateTime) -> PublicationTime {
    PublicationTime {
        date: ndt.date(),
        hour: ndt.hour(),
        has_time: true,
    }
}

impl NewsEvent {
    pub fn publication_time(&self, market_tz: Option<Tz>) -> Option<PublicationTime> {
        self.published_at
            .as_deref()
            .and_then(|raw| parse_published(raw, market_tz))
    }

    /// Case-insensitive check that the body names the company or one of
    /// the extra keywords.
    pub fn mentions(&self, keywords: &[String]) -> bool {
        let body = self.body.to_lowercase();
        std::iter::once(&self.company)
            .chain(keywords.iter())
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|k| body.contains(&k))
    }

    /// Text fed to the classifier for the preprocessed variant.
    pub fn preprocessed_text(&self) -> Option<String> {
        self.preprocessed_tokens.as_ref().map(|t| t.join(" "))
    }
}

/// Keep at most `max` events per company, preserving input order.
pub fn cap_per_company(events: Vec<NewsEvent>, max: usize) -> Vec<NewsEvent> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    events
        .into_iter()
        .filter(|e| {
            let count = seen.entry(e.company.clone()).or_insert(0);
            *count += 1;
            *count <= max
        })
        .collect()
}
