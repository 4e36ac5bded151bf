use thiserror::Error;

/// Top-level error type for the JanSathi system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// JanSathiError` so that the `?` operator works seamlessly across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JanSathiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for JanSathiError {
    fn from(err: toml::de::Error) -> Self {
        JanSathiError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for JanSathiError {
    fn from(err: toml::ser::Error) -> Self {
        JanSathiError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for JanSathiError {
    fn from(err: serde_json::Error) -> Self {
        JanSathiError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for JanSathi operations.
pub type Result<T> = std::result::Result<T, JanSathiError>;
