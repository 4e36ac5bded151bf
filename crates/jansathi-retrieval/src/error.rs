//! Error types for the retrieval subsystem.

use jansathi_core::JanSathiError;

/// Errors from embedding or vector-index calls.
///
/// The assembler catches all of these and degrades to "no context"; they
/// exist so callers that want the detail (logging, tests) still get it.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("HTTP transport error: {0}")]
    Http(String),
    #[error("endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            RetrievalError::Http(format!("connection failed: {}", err))
        } else if err.is_timeout() {
            RetrievalError::Http(format!("request timed out: {}", err))
        } else {
            RetrievalError::Http(err.to_string())
        }
    }
}

impl From<RetrievalError> for JanSathiError {
    fn from(err: RetrievalError) -> Self {
        JanSathiError::Retrieval(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RetrievalError::Http("connection refused".to_string());
        assert_eq!(err.to_string(), "HTTP transport error: connection refused");

        let err = RetrievalError::Endpoint {
            status: 401,
            body: "bad key".to_string(),
        };
        assert_eq!(err.to_string(), "endpoint returned status 401: bad key");

        let err = RetrievalError::ResponseParsing("missing field".to_string());
        assert_eq!(err.to_string(), "response parsing error: missing field");
    }

    #[test]
    fn test_converts_to_top_level_error() {
        let err: JanSathiError = RetrievalError::Http("down".to_string()).into();
        assert!(matches!(err, JanSathiError::Retrieval(_)));
        assert!(err.to_string().contains("down"));
    }
}
