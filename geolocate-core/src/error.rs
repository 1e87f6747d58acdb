use crate::coordinate::FailureKind;
use thiserror::Error;

/// Failure of a single request attempt against the geocoding endpoint
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("concurrency gate closed")]
    GateClosed,
}

impl GeocodeError {
    /// Map the last attempt's error onto the name's terminal failure
    pub fn kind(&self) -> FailureKind {
        match self {
            GeocodeError::Timeout(_) => FailureKind::Timeout,
            GeocodeError::Connect(_) => FailureKind::Network,
            GeocodeError::Status { status, .. } => FailureKind::Status(*status),
            GeocodeError::Transport(_) => FailureKind::Transport,
            GeocodeError::GateClosed => FailureKind::Cancelled,
        }
    }
}

/// Cache file could not be read, parsed, or written
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid resolver or client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
