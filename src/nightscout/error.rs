use thiserror::Error;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Nightscout URL or token is not configured")]
    MissingCredentials,
    #[error("invalid Nightscout URL: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP error, status {0}")]
    HttpStatus(u16),
    #[error("Nightscout error: {0}")]
    Service(String),
    #[error("unexpected response payload: {0}")]
    MalformedPayload(String),
    #[error("not enough glucose data available")]
    InsufficientData,
}

impl FetchError {
    /// Whether the poller should retry under its backoff policy.
    ///
    /// Configuration problems stay broken until the settings change, so
    /// retrying them only burns attempts.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::MissingCredentials | FetchError::InvalidUrl(_))
    }

    /// Short panel label for the failure
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::HttpStatus(401) | FetchError::HttpStatus(403) => "🔐 Auth",
            FetchError::HttpStatus(_) => "🌐 HTTP",
            FetchError::InsufficientData => "📊 Data",
            _ => "⚠️ Error",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
