//! Run orchestration: news events in, one event window out per event.
//!
//! Events are grouped by company and each instrument's prices are fetched
//! once, over a range covering every event of that company. Per-event and
//! per-instrument problems end up on the records as a [`WindowStatus`];
//! nothing here returns an error.

use crate::domain::calendar::TradingCalendar;
use crate::domain::config::AnalysisConfig;
use crate::domain::correlation::{compute_correlations, CorrelationResult, ScoredWindow};
use crate::domain::news::{cap_per_company, NewsEvent, PublicationTime};
use crate::domain::price_series::PriceSeries;
use crate::domain::resolver::EventDayResolver;
use crate::domain::sentiment::{score_event, SentimentScores};
use crate::domain::ticker_map::ticker_root;
use crate::domain::window::{EventWindow, WindowExtractor, WindowStatus};
use crate::ports::price_port::PricePort;
use crate::ports::sentiment_port::SentimentPort;
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            SkipReason::NoData => write!(f, "no price data in range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub company: String,
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct WindowRun {
    /// One window per input event, in input order.
    pub windows: Vec<EventWindow>,
    pub skipped: Vec<SkippedInstrument>,
}

impl WindowRun {
    pub fn count(&self, status: WindowStatus) -> usize {
        self.windows.iter().filter(|w| w.status == status).count()
    }

    pub fn resolved(&self) -> usize {
        self.count(WindowStatus::Resolved)
    }
}

/// Apply the relevance filter and the per-company cap from config.
pub fn filter_news(events: Vec<NewsEvent>, config: &AnalysisConfig) -> Vec<NewsEvent> {
    let total = events.len();
    let mut events = events;

    if config.news.require_mention {
        events.retain(|event| {
            let keywords: Vec<String> = config
                .tickers
                .ticker_for(&event.company)
                .map(|t| vec![ticker_root(t)])
                .unwrap_or_default();
            event.mentions(&keywords)
        });
    }
    if let Some(max) = config.news.max_per_company {
        events = cap_per_company(events, max);
    }

    if events.len() != total {
        tracing::info!(kept = events.len(), dropped = total - events.len(), "news filtered");
    }
    events
}

pub fn run_windows(
    price_port: &dyn PricePort,
    events: &[NewsEvent],
    config: &AnalysisConfig,
) -> WindowRun {
    let resolver = EventDayResolver::new(config.cutoff_hour);
    let extractor = WindowExtractor::new(config.window);
    let published: Vec<Option<PublicationTime>> = events
        .iter()
        .map(|e| e.publication_time(config.market_timezone))
        .collect();

    let mut windows: Vec<Option<EventWindow>> = vec![None; events.len()];
    let mut skipped = Vec::new();

    for (company, indices) in group_by_company(events) {
        let Some(ticker) = config.tickers.ticker_for(company) else {
            tracing::warn!(
                company,
                events = indices.len(),
                "no ticker mapped for company"
            );
            for &i in &indices {
                windows[i] = Some(unanchored(
                    &events[i],
                    published[i],
                    None,
                    &resolver,
                    &extractor,
                    WindowStatus::UnknownTicker,
                ));
            }
            continue;
        };

        let dates: Vec<NaiveDate> = indices
            .iter()
            .filter_map(|&i| published[i].map(|p| p.date))
            .collect();
        let Some((start, end)) = fetch_range(&dates, config) else {
            for &i in &indices {
                windows[i] = Some(unanchored(
                    &events[i],
                    None,
                    Some(ticker),
                    &resolver,
                    &extractor,
                    WindowStatus::UnparsableTimestamp,
                ));
            }
            continue;
        };

        let bars = match price_port.fetch_prices(ticker, start, end) {
            Ok(bars) if !bars.is_empty() => Some(bars),
            Ok(_) => {
                tracing::warn!(
                    company,
                    ticker,
                    %start,
                    %end,
                    "no price data, skipping instrument"
                );
                skipped.push(SkippedInstrument {
                    company: company.to_string(),
                    ticker: ticker.to_string(),
                    reason: SkipReason::NoData,
                });
                None
            }
            Err(e) => {
                tracing::warn!(
                    company,
                    ticker,
                    error = %e,
                    "price fetch failed, skipping instrument"
                );
                skipped.push(SkippedInstrument {
                    company: company.to_string(),
                    ticker: ticker.to_string(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                None
            }
        };

        let Some(bars) = bars else {
            for &i in &indices {
                windows[i] = Some(unanchored(
                    &events[i],
                    published[i],
                    Some(ticker),
                    &resolver,
                    &extractor,
                    WindowStatus::NoPriceData,
                ));
            }
            continue;
        };

        let series = PriceSeries::new(ticker, bars);
        let calendar = TradingCalendar::new(&series);
        tracing::info!(
            company,
            ticker,
            bars = series.len(),
            events = indices.len(),
            "instrument loaded"
        );

        for &i in &indices {
            windows[i] = Some(anchored(
                &events[i],
                published[i],
                ticker,
                &calendar,
                &resolver,
                &extractor,
            ));
        }
    }

    let windows: Vec<EventWindow> = windows.into_iter().flatten().collect();
    let run = WindowRun { windows, skipped };
    tracing::info!(
        events = events.len(),
        resolved = run.resolved(),
        unparsable = run.count(WindowStatus::UnparsableTimestamp),
        beyond_series = run.count(WindowStatus::BeyondSeries),
        skipped_instruments = run.skipped.len(),
        "windows extracted"
    );
    run
}

/// Companies in first-appearance order with the indices of their events.
fn group_by_company(events: &[NewsEvent]) -> Vec<(&str, Vec<usize>)> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (i, event) in events.iter().enumerate() {
        let slot = *position.entry(event.company.as_str()).or_insert_with(|| {
            groups.push((event.company.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(i);
    }
    groups
}

/// Calendar range wide enough for every window of the given publication
/// dates, padded by `buffer_days` for weekends and holidays.
pub fn fetch_range(
    dates: &[NaiveDate],
    config: &AnalysisConfig,
) -> Option<(NaiveDate, NaiveDate)> {
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    let buffer = u64::from(config.buffer_days);
    let lead = Days::new(u64::from(config.window.before).saturating_add(buffer));
    let tail = Days::new(u64::from(config.window.after).saturating_add(buffer));
    let start = min.checked_sub_days(lead).unwrap_or(NaiveDate::MIN);
    let end = max.checked_add_days(tail).unwrap_or(NaiveDate::MAX);
    Some((start, end))
}

fn unanchored(
    event: &NewsEvent,
    published: Option<PublicationTime>,
    ticker: Option<&str>,
    resolver: &EventDayResolver,
    extractor: &WindowExtractor,
    status: WindowStatus,
) -> EventWindow {
    let status = if published.is_none() {
        WindowStatus::UnparsableTimestamp
    } else {
        status
    };
    EventWindow {
        company: event.company.clone(),
        ticker: ticker.map(str::to_string),
        title: event.title.clone(),
        url: event.url.clone(),
        published_at: event.published_at.clone(),
        publication_date: published.map(|p| p.date),
        base_day: None,
        after_close: published.map(|p| resolver.is_after_close(&p)),
        status,
        slots: extractor.empty_slots(),
    }
}

fn anchored(
    event: &NewsEvent,
    published: Option<PublicationTime>,
    ticker: &str,
    calendar: &TradingCalendar<'_>,
    resolver: &EventDayResolver,
    extractor: &WindowExtractor,
) -> EventWindow {
    let Some(anchor) = published.and_then(|p| resolver.resolve(calendar, &p)) else {
        tracing::debug!(
            title = %event.title,
            raw = ?event.published_at,
            "unparsable publication timestamp"
        );
        return unanchored(
            event,
            None,
            Some(ticker),
            resolver,
            extractor,
            WindowStatus::UnparsableTimestamp,
        );
    };

    let slots = extractor.extract(calendar, &anchor);
    let status = if slots.iter().any(|s| s.is_resolved()) {
        WindowStatus::Resolved
    } else {
        tracing::debug!(
            title = %event.title,
            anchor = %anchor.anchor_date,
            "window outside price series"
        );
        WindowStatus::BeyondSeries
    };

    EventWindow {
        company: event.company.clone(),
        ticker: Some(ticker.to_string()),
        title: event.title.clone(),
        url: event.url.clone(),
        published_at: event.published_at.clone(),
        publication_date: Some(anchor.publication_date),
        base_day: anchor.base_day,
        after_close: Some(anchor.after_close),
        status,
        slots,
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Sentiment per event, aligned with the windows.
    pub scores: Vec<SentimentScores>,
    pub correlations: Vec<CorrelationResult>,
    /// Windows that entered the correlation join.
    pub joined: usize,
}

/// Score every event and correlate sentiment with the resolved windows.
/// `windows` must be the output of [`run_windows`] over the same `events`.
pub fn run_analysis(
    sentiment_port: &dyn SentimentPort,
    events: &[NewsEvent],
    windows: &[EventWindow],
    config: &AnalysisConfig,
) -> AnalysisOutcome {
    let scores: Vec<SentimentScores> = events
        .iter()
        .map(|e| score_event(sentiment_port, e))
        .collect();

    let rows: Vec<ScoredWindow<'_>> = windows
        .iter()
        .zip(&scores)
        .filter(|(w, _)| w.status == WindowStatus::Resolved)
        .map(|(window, scores)| ScoredWindow {
            window,
            scores: *scores,
        })
        .collect();

    let correlations =
        compute_correlations(&rows, config.window.offsets(), &config.correlation);
    tracing::info!(
        scored = scores.len(),
        joined = rows.len(),
        correlations = correlations.len(),
        "sentiment analysis complete"
    );

    AnalysisOutcome {
        scores,
        correlations,
        joined: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SentipriceError;
    use crate::domain::price_bar::PriceBar;
    use crate::domain::sentiment::{Classification, SentimentLabel};
    use crate::domain::ticker_map::TickerMap;
    use crate::domain::window::WindowStrategy;
    use std::cell::RefCell;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct StubPrices {
        bars: HashMap<String, Vec<PriceBar>>,
        failing: Vec<String>,
        calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl StubPrices {
        fn new() -> Self {
            Self {
                bars: HashMap::new(),
                failing: Vec::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, ticker: &str, dates: &[&str]) -> Self {
            let bars = dates
                .iter()
                .enumerate()
                .map(|(i, date)| {
                    let close = 10.0 + i as f64;
                    PriceBar {
                        ticker: ticker.into(),
                        date: d(date),
                        open: close - 0.5,
                        high: close + 1.0,
                        low: close - 1.0,
                        close,
                        volume: 1000,
                    }
                })
                .collect();
            self.bars.insert(ticker.into(), bars);
            self
        }

        fn failing(mut self, ticker: &str) -> Self {
            self.failing.push(ticker.into());
            self
        }
    }

    impl PricePort for StubPrices {
        fn fetch_prices(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<PriceBar>, SentipriceError> {
            self.calls.borrow_mut().push((ticker.into(), start, end));
            if self.failing.iter().any(|t| t == ticker) {
                return Err(SentipriceError::PriceData {
                    reason: "connection reset".into(),
                });
            }
            Ok(self
                .bars
                .get(ticker)
                .map(|bars| {
                    bars.iter()
                        .filter(|b| b.date >= start && b.date <= end)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::with_tickers(
            TickerMap::parse("TOTVS:TOTS3.SA, Locaweb:LWSA3.SA, Intelbras:INTB3.SA").unwrap(),
            "/unused",
        )
    }

    fn event(company: &str, published: Option<&str>) -> NewsEvent {
        NewsEvent {
            company: company.into(),
            title: format!("{company} headline"),
            url: format!("https://news.example/{company}"),
            published_at: published.map(str::to_string),
            body: format!("{company} reports results"),
            preprocessed_tokens: None,
        }
    }

    const WEEK: [&str; 7] = [
        "2024-02-27",
        "2024-02-28",
        "2024-02-29",
        "2024-03-01",
        "2024-03-04",
        "2024-03-05",
        "2024-03-06",
    ];

    #[test]
    fn one_window_per_event_in_input_order() {
        let prices = StubPrices::new()
            .with("TOTS3.SA", &WEEK)
            .with("LWSA3.SA", &WEEK);
        let events = vec![
            event("TOTVS", Some("2024-03-01T10:00:00")),
            event("Locaweb", Some("2024-03-01T17:30:00")),
            event("TOTVS", Some("2024-03-04T09:00:00")),
        ];
        let run = run_windows(&prices, &events, &config());

        assert_eq!(run.windows.len(), 3);
        assert_eq!(run.windows[0].company, "TOTVS");
        assert_eq!(run.windows[1].company, "Locaweb");
        assert_eq!(run.windows[2].base_day, Some(d("2024-03-04")));
        assert_eq!(run.windows[1].base_day, Some(d("2024-03-04")));
        assert_eq!(run.windows[1].after_close, Some(true));
        assert_eq!(run.resolved(), 3);
        assert!(run.skipped.is_empty());
    }

    #[test]
    fn one_fetch_per_instrument_covering_all_events() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let events = vec![
            event("TOTVS", Some("2024-03-04T09:00:00")),
            event("TOTVS", Some("2024-02-28T09:00:00")),
            event("TOTVS", Some("2024-03-01T09:00:00")),
        ];
        run_windows(&prices, &events, &config());

        let calls = prices.calls.borrow();
        assert_eq!(calls.len(), 1);
        // before 2 + buffer 7, after 2 + buffer 7
        assert_eq!(calls[0], ("TOTS3.SA".to_string(), d("2024-02-19"), d("2024-03-13")));
    }

    #[test]
    fn empty_instrument_is_skipped_without_halting() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let events = vec![
            event("Locaweb", Some("2024-03-01T10:00:00")),
            event("TOTVS", Some("2024-03-01T10:00:00")),
        ];
        let run = run_windows(&prices, &events, &config());

        assert_eq!(run.windows[0].status, WindowStatus::NoPriceData);
        assert!(!run.windows[0].has_data());
        assert_eq!(run.windows[1].status, WindowStatus::Resolved);
        assert_eq!(
            run.skipped,
            vec![SkippedInstrument {
                company: "Locaweb".into(),
                ticker: "LWSA3.SA".into(),
                reason: SkipReason::NoData,
            }]
        );
    }

    #[test]
    fn fetch_error_is_a_skip() {
        let prices = StubPrices::new().failing("TOTS3.SA");
        let run = run_windows(&prices, &[event("TOTVS", Some("2024-03-01"))], &config());
        assert_eq!(run.windows[0].status, WindowStatus::NoPriceData);
        assert!(matches!(
            &run.skipped[0].reason,
            SkipReason::FetchFailed(r) if r.contains("connection reset")
        ));
    }

    #[test]
    fn unknown_company_keeps_its_events() {
        let prices = StubPrices::new();
        let run = run_windows(&prices, &[event("Petrobras", Some("2024-03-01"))], &config());
        assert_eq!(run.windows[0].status, WindowStatus::UnknownTicker);
        assert_eq!(run.windows[0].ticker, None);
        assert_eq!(run.windows[0].slots.len(), 5);
        assert!(prices.calls.borrow().is_empty());
    }

    #[test]
    fn unparsable_timestamp_is_retained_with_nulls() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let events = vec![
            event("TOTVS", Some("yesterday")),
            event("TOTVS", None),
            event("TOTVS", Some("2024-03-01T10:00:00")),
        ];
        let run = run_windows(&prices, &events, &config());
        assert_eq!(run.windows[0].status, WindowStatus::UnparsableTimestamp);
        assert_eq!(run.windows[1].status, WindowStatus::UnparsableTimestamp);
        assert_eq!(run.windows[0].publication_date, None);
        assert!(run.windows[0].slots.iter().all(|s| !s.is_resolved()));
        assert_eq!(run.windows[2].status, WindowStatus::Resolved);
    }

    #[test]
    fn all_unparsable_does_not_fetch() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let run = run_windows(&prices, &[event("TOTVS", Some("n/a"))], &config());
        assert_eq!(run.windows[0].status, WindowStatus::UnparsableTimestamp);
        assert!(prices.calls.borrow().is_empty());
    }

    #[test]
    fn event_after_series_end_is_beyond_series() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let run = run_windows(&prices, &[event("TOTVS", Some("2024-03-06T18:00:00"))], &config());
        assert_eq!(run.windows[0].status, WindowStatus::BeyondSeries);
        assert_eq!(run.windows[0].base_day, None);
    }

    #[test]
    fn carry_forward_without_base_day_is_beyond_series() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let mut cfg = config();
        cfg.window.strategy = WindowStrategy::CalendarCarryForward;
        let events = [event("TOTVS", Some("2024-03-06T18:00:00"))];
        let run = run_windows(&prices, &events, &cfg);

        let w = &run.windows[0];
        assert_eq!(w.status, WindowStatus::BeyondSeries);
        assert_eq!(w.base_day, None);
        assert!(w.slots.iter().all(|s| !s.is_resolved() && s.no_session.is_none()));
    }

    #[test]
    fn carry_forward_weekend_event_centres_on_base_day() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let mut cfg = config();
        cfg.window.strategy = WindowStrategy::CalendarCarryForward;
        let events = [event("TOTVS", Some("2024-03-02T10:00:00"))];
        let run = run_windows(&prices, &events, &cfg);

        let w = &run.windows[0];
        assert_eq!(w.status, WindowStatus::Resolved);
        assert_eq!(w.base_day, Some(d("2024-03-04")));
        let d0 = w.slot(0).unwrap();
        assert_eq!(d0.date, w.base_day);
        assert_eq!(d0.target_date, Some(d("2024-03-04")));
        assert_eq!(d0.no_session, Some(false));
        let dm1 = w.slot(-1).unwrap();
        assert_eq!(dm1.target_date, Some(d("2024-03-03")));
        assert_eq!(dm1.date, Some(d("2024-03-01")));
        assert_eq!(dm1.no_session, Some(true));
    }

    #[test]
    fn filter_news_applies_mention_and_cap() {
        let mut cfg = config();
        cfg.news.require_mention = true;
        cfg.news.max_per_company = Some(1);

        let mut by_ticker = event("TOTVS", Some("2024-03-01"));
        by_ticker.body = "Shares of TOTS3 rallied".into();
        let mut silent = event("TOTVS", Some("2024-03-01"));
        silent.body = "Market wrap".into();
        let named = event("TOTVS", Some("2024-03-02"));

        let kept = filter_news(vec![silent, by_ticker.clone(), named], &cfg);
        assert_eq!(kept, vec![by_ticker]);
    }

    #[test]
    fn fetch_range_needs_a_date() {
        assert_eq!(fetch_range(&[], &config()), None);
    }

    #[test]
    fn fetch_range_saturates_on_huge_windows() {
        let mut cfg = config();
        cfg.window.before = u32::MAX - 3;
        cfg.window.after = u32::MAX;
        cfg.buffer_days = u32::MAX;
        let range = fetch_range(&[d("2024-03-01")], &cfg);
        assert_eq!(range, Some((NaiveDate::MIN, NaiveDate::MAX)));
    }

    struct BodyLengthPort;

    impl SentimentPort for BodyLengthPort {
        fn classify(&self, text: &str) -> Result<Classification, SentipriceError> {
            Ok(Classification {
                label: SentimentLabel::Positive,
                confidence: (text.len() % 10) as f64 / 10.0,
            })
        }
    }

    #[test]
    fn analysis_scores_every_event_but_joins_only_resolved() {
        let prices = StubPrices::new().with("TOTS3.SA", &WEEK);
        let events = vec![
            event("TOTVS", Some("2024-02-29T10:00:00")),
            event("TOTVS", Some("bad")),
            event("Locaweb", Some("2024-03-01T10:00:00")),
        ];
        let mut cfg = config();
        cfg.window.before = 1;
        cfg.window.after = 1;
        let run = run_windows(&prices, &events, &cfg);
        let outcome = run_analysis(&BodyLengthPort, &events, &run.windows, &cfg);

        assert_eq!(outcome.scores.len(), 3);
        assert_eq!(outcome.joined, 1);
        // one row is below min_samples
        assert!(outcome.correlations.is_empty());
    }
}
