//! Sentiment scores on the -10..=10 scale.
//!
//! Classification itself happens behind [`SentimentPort`]; this module only
//! maps classifier output onto the scale and handles the fallbacks.

use crate::domain::news::NewsEvent;
use crate::ports::sentiment_port::SentimentPort;
use std::fmt;
use std::str::FromStr;

pub const SCALE_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" => Ok(SentimentLabel::Positive),
            "negative" | "neg" => Ok(SentimentLabel::Negative),
            "neutral" | "neu" => Ok(SentimentLabel::Neutral),
            other => Err(format!("unknown sentiment label '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Classifier confidence in `0.0..=1.0`.
    pub confidence: f64,
}

impl Classification {
    /// Signed score: positive and negative scale confidence by ten, neutral is zero.
    pub fn to_scale(&self) -> f64 {
        let confidence = self.confidence.clamp(0.0, 1.0);
        let raw = match self.label {
            SentimentLabel::Positive => confidence * SCALE_MAX,
            SentimentLabel::Negative => -confidence * SCALE_MAX,
            SentimentLabel::Neutral => 0.0,
        };
        round2(raw)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentVariant {
    /// Raw article body.
    Original,
    /// Body after upstream cleaning (stopwords, lemmas).
    Preprocessed,
}

impl SentimentVariant {
    pub const ALL: [SentimentVariant; 2] =
        [SentimentVariant::Original, SentimentVariant::Preprocessed];
}

impl fmt::Display for SentimentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentVariant::Original => write!(f, "original"),
            SentimentVariant::Preprocessed => write!(f, "preprocessed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScores {
    pub original: f64,
    pub preprocessed: f64,
}

impl SentimentScores {
    pub fn get(&self, variant: SentimentVariant) -> f64 {
        match variant {
            SentimentVariant::Original => self.original,
            SentimentVariant::Preprocessed => self.preprocessed,
        }
    }
}

/// Score one text. Empty text and classifier failures both yield 0.0.
pub fn score_text(port: &dyn SentimentPort, text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    match port.classify(text) {
        Ok(c) => c.to_scale(),
        Err(e) => {
            tracing::warn!(error = %e, "sentiment classification failed, scoring as neutral");
            0.0
        }
    }
}

/// Score both variants of an event. Without preprocessed tokens the
/// preprocessed score repeats the original one.
pub fn score_event(port: &dyn SentimentPort, event: &NewsEvent) -> SentimentScores {
    let original = score_text(port, &event.body);
    let preprocessed = match event.preprocessed_text() {
        Some(text) => score_text(port, &text),
        None => original,
    };
    SentimentScores {
        original,
        preprocessed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SentimentSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentSummary {
    pub fn compute(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Some(Self {
            mean,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            positive: scores.iter().filter(|s| **s > 0.0).count(),
            negative: scores.iter().filter(|s| **s < 0.0).count(),
            neutral: scores.iter().filter(|s| **s == 0.0).count(),
        })
    }
}
