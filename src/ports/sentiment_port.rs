//! Sentiment classifier port (`text -> classification`).

use crate::domain::error::SentipriceError;
use crate::domain::sentiment::Classification;

pub trait SentimentPort {
    fn classify(&self, text: &str) -> Result<Classification, SentipriceError>;
}
