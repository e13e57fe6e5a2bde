//! Domain error types.

/// Top-level error type for sentiprice.
///
/// Only run-level failures travel through this type. Per-event and
/// per-instrument problems are recorded on the output instead.
#[derive(Debug, thiserror::Error)]
pub enum SentipriceError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("news data error: {reason}")]
    NewsData { reason: String },

    #[error("sentiment classifier error: {reason}")]
    Sentiment { reason: String },

    #[error("no data: {what}")]
    NoData { what: String },

    #[error("output error: {reason}")]
    Output { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SentipriceError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SentipriceError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SentipriceError> for std::process::ExitCode {
    fn from(err: &SentipriceError) -> Self {
        let code: u8 = match err {
            SentipriceError::Io(_) => 1,
            SentipriceError::ConfigParse { .. }
            | SentipriceError::ConfigMissing { .. }
            | SentipriceError::ConfigInvalid { .. } => 2,
            SentipriceError::PriceData { .. } | SentipriceError::NewsData { .. } => 3,
            SentipriceError::Sentiment { .. } => 4,
            SentipriceError::NoData { .. } => 5,
            SentipriceError::Output { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
