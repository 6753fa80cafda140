use thiserror::Error;

/// Failures that can occur while fetching and parsing pages.
///
/// Absence of data is not an error: a page with zero emails, a rejected
/// candidate, or an unresolved country are ordinary outcomes counted in
/// the run statistics. Only operations that genuinely failed end up here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("browser service error (status {status}): {message}")]
    Browser { status: u16, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid CSS selector: {selector}")]
    Selector { selector: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        ScrapeError::Fetch {
            url,
            reason: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::InvalidUrl(err.to_string())
    }
}
