//! Bridge error types

use kasir_cert::CertError;
use thiserror::Error;

/// Message surfaced when the broker cannot be reached
pub const BROKER_NOT_DETECTED: &str =
    "Print broker not detected. Ensure it is installed and running.";

/// Failures reported by a broker transport
///
/// Cloneable so a single outcome can be delivered to every request waiting
/// on the same connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Broker process not listening / connection refused
    #[error("Unable to establish connection with broker: {0}")]
    Unreachable(String),

    /// Broker already holds an open session for this client
    #[error("An open session with the broker already exists: {0}")]
    SessionExists(String),

    /// Trust handshake signing failed locally
    #[error("Challenge signing failed: {0}")]
    Signing(String),

    /// Connection closed while a request was outstanding
    #[error("Connection closed")]
    Closed,

    /// Request issued without an active session
    #[error("Not connected to broker")]
    NotConnected,

    /// No response within the request timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Malformed or oversized frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error text reported by the broker
    #[error("Broker error: {0}")]
    Broker(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl TransportError {
    /// Maps a broker-reported error message onto the transport taxonomy
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("already exists") {
            Self::SessionExists(message)
        } else if lower.contains("unable to establish") {
            Self::Unreachable(message)
        } else {
            Self::Broker(message)
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io(e.to_string()),
        }
    }
}

/// Errors returned by the public bridge operations
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// Broker unreachable
    #[error("Print broker not detected. Ensure it is installed and running.")]
    Connectivity { detail: String },

    /// Key import or challenge signing failed; the connect attempt is aborted
    #[error("Signing error: {0}")]
    Signing(String),

    /// Connect attempt exceeded the configured bound
    #[error("Connect timed out after {0} ms")]
    Timeout(u64),

    /// Any other transport failure, unchanged
    #[error(transparent)]
    Transport(TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unreachable(detail) => Self::Connectivity { detail },
            TransportError::Signing(msg) => Self::Signing(msg),
            other => Self::Transport(other),
        }
    }
}

impl From<CertError> for BridgeError {
    fn from(e: CertError) -> Self {
        Self::Credential(e.to_string())
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
