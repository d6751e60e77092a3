use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Unknown list format: {0}")]
    UnknownFormat(String),

    #[error("Parse error on line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    #[error("Total blackout: no source produced any entries this cycle")]
    TotalBlackout,

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Invalid allow override: {0}")]
    InvalidOverride(String),
}

/// Why a single source fetch failed. Never fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

impl FetchError {
    /// Whether another attempt within the same cycle can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::Status(code) => *code >= 500 || *code == 408 || *code == 429,
            FetchError::BodyTooLarge { .. } => false,
        }
    }
}
