//! Core domain types and logic. No I/O happens in here.

pub mod price_bar;
pub mod daily_metrics;
pub mod price_series;
pub mod calendar;
pub mod news;
pub mod resolver;
pub mod window;
pub mod table;
pub mod ticker_map;
pub mod sentiment;
pub mod correlation;
pub mod config;
pub mod pipeline;
pub mod error;
