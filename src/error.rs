//! Error types for secure-stream

use bytes::Bytes;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for secure-stream operations
#[derive(Debug, Error)]
pub enum Error {
    /// Trust policy or TLS configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Host or port rejected before any I/O
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// DNS resolution failed or returned no addresses
    #[error("failed to resolve '{host}': {source}")]
    Resolve {
        /// Host that could not be resolved
        host: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// TCP connection could not be established
    #[error("connection to {endpoint} failed: {source}")]
    Connect {
        /// Target endpoint (`host:port`)
        endpoint: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// TCP connect plus handshake did not finish within the configured timeout
    #[error("connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Target endpoint (`host:port`)
        endpoint: String,
        /// Configured connect timeout
        timeout: Duration,
    },

    /// TLS handshake failed (including certificate rejection)
    #[error("TLS handshake with {endpoint} failed: {source}")]
    Handshake {
        /// Target endpoint (`host:port`)
        endpoint: String,
        /// Underlying TLS error
        #[source]
        source: io::Error,
    },

    /// Operation requires an open session
    #[error("not connected")]
    NotConnected,

    /// Operation is not valid in the current connection state
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Read failed mid-response; carries what was accumulated before the failure
    #[error("stream error after {} response bytes: {source}", partial.len())]
    Stream {
        /// Underlying transport error
        #[source]
        source: io::Error,
        /// Response bytes accumulated before the failure
        partial: Bytes,
    },

    /// Response grew past the configured maximum size
    #[error("response exceeded {limit} bytes")]
    ResponseTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// I/O error on an established session
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error came from the connect phase itself: endpoint
    /// validation, resolution, TCP setup, or the TLS handshake.
    ///
    /// `SecureStreamClient::connect` collapses these into `false`. It also
    /// returns `false` for `InvalidState` when no trust policy is configured.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidEndpoint(_)
                | Error::Resolve { .. }
                | Error::Connect { .. }
                | Error::ConnectTimeout { .. }
                | Error::Handshake { .. }
        )
    }

    /// Short label used for metrics and log fields
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::InvalidEndpoint(_) => "invalid_endpoint",
            Error::Resolve { .. } => "resolve",
            Error::Connect { .. } => "connect",
            Error::ConnectTimeout { .. } => "connect_timeout",
            Error::Handshake { .. } => "handshake",
            Error::NotConnected => "not_connected",
            Error::InvalidState { .. } => "invalid_state",
            Error::Stream { .. } => "stream",
            Error::ResponseTooLarge { .. } => "response_too_large",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_failures_are_grouped() {
        let refused = Error::Connect {
            endpoint: "localhost:1".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(refused.is_connect_failure());
        assert!(Error::InvalidEndpoint("port 0".into()).is_connect_failure());
        assert!(!Error::NotConnected.is_connect_failure());
        assert!(!Error::InvalidState {
            expected: "trust policy configured".into(),
            actual: "unconfigured".into(),
        }
        .is_connect_failure());
        assert!(!Error::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_connect_failure());
    }

    #[test]
    fn test_stream_error_reports_partial_length() {
        let err = Error::Stream {
            source: io::Error::from(io::ErrorKind::ConnectionReset),
            partial: Bytes::from_static(b"abc"),
        };
        assert!(err.to_string().contains("after 3 response bytes"));
        assert_eq!(err.category(), "stream");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, Error::Io(_)));
    }
}
