use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("other: {0}")]
    Other(String),
}

pub type AppResult<T, E = AppError> = Result<T, E>;

/// Failure of a single candle fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection problems, timeouts, 5xx and rate limiting. Retried once.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The exchange rejected the request (bad symbol, bad interval, malformed payload).
    #[error("exchange rejected request: {0}")]
    PermanentExchange(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::TransientNetwork(_))
    }
}

/// Failure of one (symbol, timeframe) iteration of a sweep.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("insufficient data: got {got} candles, need {need}")]
    InsufficientData { got: usize, need: usize },

    #[error("pair processing panicked: {0}")]
    Panicked(String),
}

/// Failure to deliver to one chat recipient.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("chat api rejected message ({code}): {description}")]
    Rejected { code: i64, description: String },
}
