//! JSON news file adapter.
//!
//! Reads a JSON array of article objects. Field names are accepted in
//! English or in the Portuguese spelling used by the scraping stage
//! (`empresa`, `titulo`, `data_publicacao`, `conteudo`,
//! `conteudo_processado`). Missing or null fields become empty values.

use crate::domain::error::SentipriceError;
use crate::domain::news::NewsEvent;
use crate::ports::news_port::NewsPort;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct JsonNewsAdapter {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tokens {
    List(Vec<String>),
    Text(String),
}

impl Tokens {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tokens::List(v) => v,
            Tokens::Text(s) => s.split_whitespace().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsRecord {
    #[serde(alias = "empresa", default)]
    company: Option<String>,
    #[serde(alias = "titulo", default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(alias = "data_publicacao", default)]
    published_at: Option<String>,
    #[serde(alias = "conteudo", default)]
    body: Option<String>,
    #[serde(alias = "conteudo_processado", default)]
    preprocessed_tokens: Option<Tokens>,
}

impl From<NewsRecord> for NewsEvent {
    fn from(r: NewsRecord) -> Self {
        NewsEvent {
            company: r.company.unwrap_or_default().trim().to_string(),
            title: r.title.unwrap_or_default(),
            url: r.url.unwrap_or_default(),
            published_at: r.published_at.filter(|s| !s.trim().is_empty()),
            body: r.body.unwrap_or_default(),
            preprocessed_tokens: r.preprocessed_tokens.map(Tokens::into_vec),
        }
    }
}

impl JsonNewsAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(content: &str) -> Result<Vec<NewsEvent>, SentipriceError> {
        let records: Vec<serde_json::Value> =
            serde_json::from_str(content).map_err(|e| SentipriceError::NewsData {
                reason: format!("expected a JSON array of news objects: {e}"),
            })?;

        let mut events = Vec::with_capacity(records.len());
        for (i, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<NewsRecord>(value) {
                Ok(record) => events.push(NewsEvent::from(record)),
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "skipping malformed news record");
                }
            }
        }
        Ok(events)
    }
}

impl NewsPort for JsonNewsAdapter {
    fn load_news(&self) -> Result<Vec<NewsEvent>, SentipriceError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SentipriceError::NewsData {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let events = Self::parse(&content)?;
        tracing::info!(path = %self.path.display(), events = events.len(), "news loaded");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_portuguese_field_names() {
        let json = r#"[
            {
                "empresa": "TOTVS",
                "titulo": "TOTVS anuncia aquisição",
                "url": "https://news.example/totvs",
                "data_publicacao": "2024-03-01T17:30:00",
                "conteudo": "A TOTVS anunciou hoje...",
                "conteudo_processado": ["totvs", "anunciar", "hoje"]
            }
        ]"#;
        let events = JsonNewsAdapter::parse(json).unwrap();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.company, "TOTVS");
        assert_eq!(e.title, "TOTVS anuncia aquisição");
        assert_eq!(e.published_at.as_deref(), Some("2024-03-01T17:30:00"));
        assert_eq!(e.body, "A TOTVS anunciou hoje...");
        assert_eq!(
            e.preprocessed_tokens,
            Some(vec!["totvs".into(), "anunciar".into(), "hoje".into()])
        );
    }

    #[test]
    fn parses_english_field_names_and_token_string() {
        let json = r#"[{"company": "Locaweb", "title": "t", "url": "u",
                        "published_at": "2024-03-01", "body": "b",
                        "preprocessed_tokens": "strong growth"}]"#;
        let events = JsonNewsAdapter::parse(json).unwrap();
        assert_eq!(events[0].company, "Locaweb");
        assert_eq!(
            events[0].preprocessed_tokens,
            Some(vec!["strong".into(), "growth".into()])
        );
    }

    #[test]
    fn missing_and_null_fields_become_empty() {
        let json = r#"[{"empresa": "Intelbras", "data_publicacao": null, "conteudo": ""}]"#;
        let events = JsonNewsAdapter::parse(json).unwrap();
        let e = &events[0];
        assert_eq!(e.title, "");
        assert_eq!(e.url, "");
        assert_eq!(e.published_at, None);
        assert_eq!(e.preprocessed_tokens, None);
    }

    #[test]
    fn blank_timestamp_is_none() {
        let events =
            JsonNewsAdapter::parse(r#"[{"empresa": "X", "data_publicacao": "  "}]"#).unwrap();
        assert_eq!(events[0].published_at, None);
    }

    #[test]
    fn malformed_record_is_skipped() {
        let json = r#"[{"empresa": 42}, {"empresa": "TOTVS"}]"#;
        let events = JsonNewsAdapter::parse(json).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].company, "TOTVS");
    }

    #[test]
    fn non_array_is_error() {
        let result = JsonNewsAdapter::parse(r#"{"empresa": "TOTVS"}"#);
        assert!(matches!(result, Err(SentipriceError::NewsData { .. })));
    }

    #[test]
    fn load_news_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"empresa": "TOTVS", "titulo": "a"}}, {{"empresa": "TOTVS", "titulo": "b"}}]"#
        )
        .unwrap();
        let adapter = JsonNewsAdapter::new(file.path());
        let events = adapter.load_news().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].title, "b");
    }

    #[test]
    fn load_news_missing_file_is_error() {
        let adapter = JsonNewsAdapter::new("/nonexistent/news.json");
        assert!(matches!(
            adapter.load_news(),
            Err(SentipriceError::NewsData { .. })
        ));
    }
}
