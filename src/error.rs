use thiserror::Error;
use tokio_util::codec::LinesCodecError;

pub type Result<T> = std::result::Result<T, NotifierError>;

/// Errors that affect the pipeline as a whole.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The input boundary failed. Always fatal.
    #[error("Input error: {0}")]
    InputError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The inbound channel has been closed by shutdown.
    #[error("Pipeline is closed, message rejected")]
    Closed,

    #[error("HTTP client error: {0}")]
    ClientError(String),
}

impl From<validator::ValidationErrors> for NotifierError {
    fn from(err: validator::ValidationErrors) -> Self {
        NotifierError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for NotifierError {
    fn from(err: serde_json::Error) -> Self {
        NotifierError::ConfigurationError(err.to_string())
    }
}

impl From<LinesCodecError> for NotifierError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => {
                NotifierError::InputError("line exceeds maximum length".to_string())
            }
            LinesCodecError::Io(e) => NotifierError::InputError(e.to_string()),
        }
    }
}

/// A single failed delivery attempt. Reported by the worker, never escalated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Endpoint rejected notification with HTTP {status}")]
    Rejected { status: u16 },
}

impl DeliveryError {
    pub fn network(message: impl Into<String>) -> Self {
        DeliveryError::Network(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        DeliveryError::InvalidRequest(message.into())
    }
}
