//! Network error types

use std::io;
use std::time::Duration;

use slotbook_core::BackendError;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Request build error: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid path segment: {0:?}")]
    InvalidSegment(String),

    #[error("Server answered {status}")]
    Status { status: u16, message: Option<String> },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<Error> for BackendError {
    fn from(e: Error) -> Self {
        match e {
            Error::Status { status, message } => BackendError::Rejected { status, message },
            Error::Timeout(after) => BackendError::Timeout(after),
            Error::Json(e) => BackendError::Decode(e.to_string()),
            Error::Protocol(detail) => BackendError::Decode(detail),
            Error::InvalidSegment(segment) => {
                BackendError::InvalidRequest(format!("unsafe identifier {:?}", segment))
            }
            Error::InvalidUrl(detail) => BackendError::InvalidRequest(detail),
            Error::Request(e) => BackendError::InvalidRequest(e.to_string()),
            Error::Io(e) => BackendError::Network(e.to_string()),
            Error::Http(e) => BackendError::Network(e.to_string()),
            Error::Tls(detail) => BackendError::Network(detail),
        }
    }
}
