//! Port traits: the seams between domain logic and I/O.

pub mod config_port;
pub mod news_port;
pub mod price_port;
pub mod report_port;
pub mod sentiment_port;
