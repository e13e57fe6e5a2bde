#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use sentiprice::domain::error::SentipriceError;
use sentiprice::domain::news::NewsEvent;
pub use sentiprice::domain::price_bar::PriceBar;
use sentiprice::domain::sentiment::{Classification, SentimentLabel};
use sentiprice::ports::news_port::NewsPort;
use sentiprice::ports::price_port::PricePort;
use sentiprice::ports::sentiment_port::SentimentPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PricePort for MockPricePort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SentipriceError> {
        self.calls
            .borrow_mut()
            .push((ticker.to_string(), start_date, end_date));
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SentipriceError::PriceData {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub struct MockNewsPort {
    pub events: Vec<NewsEvent>,
}

impl NewsPort for MockNewsPort {
    fn load_news(&self) -> Result<Vec<NewsEvent>, SentipriceError> {
        Ok(self.events.clone())
    }
}

/// Classifies by keyword: "good" is positive, "bad" negative, otherwise
/// neutral. Confidence comes from the number of keyword hits.
pub struct KeywordSentimentPort;

impl SentimentPort for KeywordSentimentPort {
    fn classify(&self, text: &str) -> Result<Classification, SentipriceError> {
        let good = text.matches("good").count() as f64;
        let bad = text.matches("bad").count() as f64;
        let (label, hits) = if good > bad {
            (SentimentLabel::Positive, good - bad)
        } else if bad > good {
            (SentimentLabel::Negative, bad - good)
        } else {
            (SentimentLabel::Neutral, 0.0)
        };
        Ok(Classification {
            label,
            confidence: (hits / 10.0).min(1.0),
        })
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(ticker: &str, date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        ticker: ticker.to_string(),
        date: date(date_str),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

pub fn make_bar_ohlc(ticker: &str, date_str: &str, open: f64, close: f64) -> PriceBar {
    PriceBar {
        open,
        high: open.max(close) + 0.5,
        low: open.min(close) - 0.5,
        ..make_bar(ticker, date_str, close)
    }
}

/// Weekday bars from `start`, skipping weekends, closes following `closes`.
pub fn weekday_bars(ticker: &str, start: &str, closes: &[f64]) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(closes.len());
    let mut d = date(start);
    for &close in closes {
        while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            d = d.succ_opt().unwrap();
        }
        bars.push(PriceBar {
            ticker: ticker.to_string(),
            date: d,
            open: close * 0.99,
            high: close * 1.01,
            low: close * 0.98,
            close,
            volume: 1000,
        });
        d = d.succ_opt().unwrap();
    }
    bars
}

/// `n` weekday bars with a gently rising close.
pub fn generate_bars(ticker: &str, start: &str, n: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    weekday_bars(ticker, start, &closes)
}

pub fn news(company: &str, published_at: &str, body: &str) -> NewsEvent {
    NewsEvent {
        company: company.to_string(),
        title: format!("{company}: {body}"),
        url: format!("https://news.example/{}", company.to_lowercase()),
        published_at: Some(published_at.to_string()),
        body: body.to_string(),
        preprocessed_tokens: None,
    }
}
