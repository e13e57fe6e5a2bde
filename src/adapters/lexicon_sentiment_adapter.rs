//! Keyword lexicon sentiment classifier.
//!
//! A small financial lexicon in English and Portuguese. Term weights are
//! summed over the text, a negation word directly before a term flips its
//! sign, and the sum is squashed into `-1..1` with `x / sqrt(x^2 + 15)`.

use crate::domain::error::SentipriceError;
use crate::domain::sentiment::{Classification, SentimentLabel};
use crate::ports::sentiment_port::SentimentPort;

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEUTRAL_BAND: f64 = 0.05;

const POSITIVE_TERMS: &[(&str, f64)] = &[
    ("surge", 2.0),
    ("surges", 2.0),
    ("rally", 2.0),
    ("rallies", 2.0),
    ("soar", 2.5),
    ("soars", 2.5),
    ("record", 1.5),
    ("profit", 1.5),
    ("profits", 1.5),
    ("growth", 1.5),
    ("beat", 1.5),
    ("beats", 1.5),
    ("upgrade", 1.5),
    ("bullish", 2.5),
    ("acquisition", 1.0),
    ("partnership", 1.0),
    ("dividend", 1.0),
    ("dividends", 1.0),
    ("expansion", 1.0),
    ("strong", 1.0),
    ("gain", 1.5),
    ("gains", 1.5),
    ("lucro", 1.5),
    ("lucros", 1.5),
    ("crescimento", 1.5),
    ("alta", 1.5),
    ("recorde", 1.5),
    ("aquisição", 1.0),
    ("parceria", 1.0),
    ("dividendos", 1.0),
    ("expansão", 1.0),
    ("valorização", 2.0),
    ("forte", 1.0),
    ("supera", 1.5),
    ("avanço", 1.5),
    ("otimismo", 2.0),
];

const NEGATIVE_TERMS: &[(&str, f64)] = &[
    ("crash", -2.5),
    ("plunge", -2.5),
    ("plunges", -2.5),
    ("loss", -1.5),
    ("losses", -1.5),
    ("decline", -1.5),
    ("declines", -1.5),
    ("downgrade", -1.5),
    ("bearish", -2.5),
    ("lawsuit", -2.0),
    ("fraud", -3.0),
    ("breach", -2.0),
    ("hack", -2.0),
    ("layoffs", -1.5),
    ("weak", -1.0),
    ("miss", -1.5),
    ("misses", -1.5),
    ("prejuízo", -2.0),
    ("prejuízos", -2.0),
    ("queda", -1.5),
    ("perda", -1.5),
    ("perdas", -1.5),
    ("demissões", -1.5),
    ("processo", -1.0),
    ("fraude", -3.0),
    ("rebaixamento", -1.5),
    ("desvalorização", -2.0),
    ("fraco", -1.0),
    ("crise", -2.0),
    ("pessimismo", -2.0),
    ("ataque", -1.5),
    ("vazamento", -2.0),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "não", "nunca", "sem"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentimentAdapter;

impl LexiconSentimentAdapter {
    pub fn new() -> Self {
        Self
    }

    fn term_weight(token: &str) -> Option<f64> {
        POSITIVE_TERMS
            .iter()
            .chain(NEGATIVE_TERMS)
            .find(|(term, _)| *term == token)
            .map(|(_, w)| *w)
    }

    /// Normalized polarity in `-1..1`.
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let raw: f64 = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, token)| {
                let weight = Self::term_weight(token)?;
                let negated = i > 0 && NEGATIONS.contains(&tokens[i - 1].as_str());
                Some(if negated { -weight } else { weight })
            })
            .sum();

        raw / (raw * raw + NORMALIZATION_ALPHA).sqrt()
    }
}

impl SentimentPort for LexiconSentimentAdapter {
    fn classify(&self, text: &str) -> Result<Classification, SentipriceError> {
        let polarity = self.polarity(text);
        let classification = if polarity >= NEUTRAL_BAND {
            Classification {
                label: SentimentLabel::Positive,
                confidence: polarity,
            }
        } else if polarity <= -NEUTRAL_BAND {
            Classification {
                label: SentimentLabel::Negative,
                confidence: -polarity,
            }
        } else {
            Classification {
                label: SentimentLabel::Neutral,
                confidence: 1.0 - polarity.abs(),
            }
        };
        Ok(classification)
    }
}
