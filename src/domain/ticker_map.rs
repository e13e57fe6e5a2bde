//! Company name to ticker mapping.
//!
//! Parsed from a `Company:TICKER, Company:TICKER` list. Lookup tries an
//! exact name first, then a case-insensitive containment match in either
//! direction, in declaration order.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerMapError {
    #[error("empty entry in ticker list")]
    EmptyEntry,

    #[error("entry '{0}' is not of the form Company:TICKER")]
    MalformedEntry(String),

    #[error("duplicate company: {0}")]
    DuplicateCompany(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerMap {
    entries: Vec<(String, String)>,
}

impl TickerMap {
    pub fn from_pairs<I, C, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(c, t)| (c.into(), t.into()))
                .collect(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, TickerMapError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for token in input.split(',') {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err(TickerMapError::EmptyEntry);
            }
            let (company, ticker) = trimmed
                .rsplit_once(':')
                .map(|(c, t)| (c.trim(), t.trim()))
                .filter(|(c, t)| !c.is_empty() && !t.is_empty())
                .ok_or_else(|| TickerMapError::MalformedEntry(trimmed.to_string()))?;

            if !seen.insert(company.to_lowercase()) {
                return Err(TickerMapError::DuplicateCompany(company.to_string()));
            }
            entries.push((company.to_string(), ticker.to_uppercase()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, t)| (c.as_str(), t.as_str()))
    }

    pub fn ticker_for(&self, company: &str) -> Option<&str> {
        if let Some((_, t)) = self.entries.iter().find(|(c, _)| c == company) {
            return Some(t);
        }

        let needle = company.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(c, _)| {
                let known = c.to_lowercase();
                known.contains(&needle) || needle.contains(&known)
            })
            .map(|(_, t)| t.as_str())
    }
}

/// `TOTS3.SA` -> `tots3`: the exchange-independent symbol used for
/// mention checks in article bodies.
pub fn ticker_root(ticker: &str) -> String {
    ticker
        .split('.')
        .next()
        .unwrap_or(ticker)
        .trim()
        .to_lowercase()
}
