//! Error types for the courseforge client

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Network-level failure: the endpoint could not be reached at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    ConnectionRefused,
    TimedOut,
    HostNotFound,
    ConnectionReset,
}

/// Errors that can occur when using the courseforge client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint is unreachable
    #[error("transport failure ({kind:?}): {source}")]
    Transport {
        kind: TransportFailure,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed for another reason
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Transport failure kind, if the endpoint was unreachable
    pub fn transport_failure(&self) -> Option<TransportFailure> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match classify_transport(&err) {
            Some(kind) => Self::Transport { kind, source: err },
            None => Self::RequestFailed(err),
        }
    }
}

/// Identifies refused, timed out, unresolved and reset connections.
///
/// reqwest wraps the underlying cause several layers deep, so the whole
/// source chain is inspected.
pub fn classify_transport(err: &reqwest::Error) -> Option<TransportFailure> {
    if err.is_timeout() {
        return Some(TransportFailure::TimedOut);
    }

    let mut cause: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(current) = cause {
        // Resolver failures carry no dedicated io::ErrorKind; hyper-util
        // reports them with this message prefix
        if current.to_string().contains("dns error") {
            return Some(TransportFailure::HostNotFound);
        }

        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return Some(TransportFailure::ConnectionRefused);
                }
                io::ErrorKind::TimedOut => return Some(TransportFailure::TimedOut),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe => {
                    return Some(TransportFailure::ConnectionReset);
                }
                _ => {}
            }
        }

        cause = current.source();
    }

    None
}
