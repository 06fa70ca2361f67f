//! Domain errors for edge discovery.
//!
//! `DiscoveryError` is what callers of the service see. The port-level
//! errors (`StoreError`, `TransportError`, `NetworkError`, `ClientError`) are produced by
//! adapters and converted with `?`.

use thiserror::Error;

/// Errors from a keyed record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record stored under the key
    #[error("record not found: {0}")]
    NotFound(String),
    /// Backing file could not be read or written
    #[error("store I/O failed: {0}")]
    Io(String),
    /// Record could not be encoded or decoded
    #[error("record serialization failed: {0}")]
    Serialization(String),
}

/// Errors from the multicast discovery transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Operation needs a registered server
    #[error("no multicast server registered")]
    NotRegistered,
    /// Registration with the multicast responder failed
    #[error("multicast registration failed: {0}")]
    RegistrationFailed(String),
    /// Peer event feed could not be opened
    #[error("peer event subscription failed: {0}")]
    SubscriptionFailed(String),
    /// Socket-level failure
    #[error("transport I/O failed: {0}")]
    Io(String),
}

/// Errors from the local network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// No usable network interface
    #[error("no usable network interface")]
    NoInterface,
    /// Interfaces exist but none carries an address
    #[error("no local IP address available")]
    NoAddress,
    /// OS-level failure while reading interfaces
    #[error("network I/O failed: {0}")]
    Io(String),
}

/// Errors from the client that queries a peer's orchestration info.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Peer did not answer
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    /// Peer answered with something that is not orchestration info
    #[error("invalid orchestration info response: {0}")]
    InvalidResponse(String),
}

/// Errors returned by discovery operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Bad argument: empty, duplicate or reserved service name, or
    /// advertised metadata over its size budget
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Lookup miss surfaced to the caller
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation attempted in the wrong lifecycle state
    #[error("system error: {0}")]
    SystemError(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// Termination signal raised while waiting
    #[error("operation cancelled by shutdown")]
    Cancelled,

    /// A bounded retry policy ran out of attempts
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl DiscoveryError {
    /// Short label used for the `error_type` metric dimension.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidParam(_) => "invalid_param",
            Self::NotFound(_) => "not_found",
            Self::SystemError(_) => "system",
            Self::Store(_) => "store",
            Self::Transport(_) => "transport",
            Self::Network(_) => "network",
            Self::Client(_) => "client",
            Self::Cancelled => "cancelled",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    pub(crate) fn no_server() -> Self {
        Self::SystemError("no server initiated yet".to_string())
    }
}

/// Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts() {
        let err: DiscoveryError = StoreError::NotFound("edge-orchestration-x".into()).into();
        assert!(matches!(err, DiscoveryError::Store(StoreError::NotFound(_))));
        assert_eq!(err.error_type(), "store");
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = DiscoveryError::RetriesExhausted {
            attempts: 3,
            last_error: "no local IP address available".into(),
        };
        assert_eq!(
            err.to_string(),
            "gave up after 3 attempts: no local IP address available"
        );
    }
}
