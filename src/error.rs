use thiserror::Error;

/// Failure of a single call to a search API. Every variant counts as a
/// failed attempt for retry and circuit-breaker accounting.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// The service answered with its own error envelope
    #[error("service error: {0}")]
    Service(String),

    /// Body could not be read as the expected JSON envelope
    #[error("malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Transport(e) if e.is_timeout())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
