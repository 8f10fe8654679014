//! Error types for JumpCloud API calls.
//!
//! Every error converts into the [`AdapterError`] the reconciler
//! understands. Non-success bodies are kept verbatim for diagnostics.

use declarative::AdapterError;

/// Result type alias for API calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during API calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered 404 for the addressed entity.
    #[error("{0} not found")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        message: String,
    },

    /// The request did not produce a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The client configuration is unusable.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The operation deadline passed or it was cancelled.
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Build the error for a non-success HTTP status.
    pub fn from_status(status: u16, what: &str, body: String) -> Self {
        if status == 404 {
            return Self::NotFound(what.to_string());
        }
        let message = if body.trim().is_empty() {
            format!("empty response body for {what}")
        } else {
            body
        };
        Self::Status { status, message }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Status {
                status: code,
                message: format!("HTTP {code}"),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<Error> for AdapterError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => Self::NotFound(what),
            Error::Status { status, message } => Self::Api { status, message },
            Error::Transport(message) => Self::Transport(message),
            Error::InvalidResponse(message) | Error::InvalidConfig(message) => {
                Self::InvalidResponse(message)
            }
            Error::Cancelled => Self::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_404_is_not_found() {
        let err = Error::from_status(404, "usergroups/grp_1", "{\"message\":\"Not Found\"}".into());
        assert!(matches!(err, Error::NotFound(ref what) if what == "usergroups/grp_1"));
    }

    #[test]
    fn test_from_status_keeps_body_verbatim() {
        let body = r#"{"message":"Bad Request: name must be unique"}"#;
        let err = Error::from_status(400, "usergroups", body.into());
        match &err {
            Error::Status { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, body);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_status_empty_body() {
        let err = Error::from_status(502, "usergroups", String::new());
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("empty response body for usergroups"));
    }

    #[test]
    fn test_into_adapter_error() {
        let adapter: AdapterError = Error::from_status(409, "usergroups", "conflict".into()).into();
        assert_eq!(
            adapter,
            AdapterError::Api {
                status: 409,
                message: "conflict".into()
            }
        );

        let adapter: AdapterError = Error::NotFound("grp_1".into()).into();
        assert_eq!(adapter, AdapterError::NotFound("grp_1".into()));

        let adapter: AdapterError = Error::Cancelled.into();
        assert_eq!(adapter, AdapterError::Cancelled);
    }
}
