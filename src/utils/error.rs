//! Error types for redis-fleet-status

use std::io;
use thiserror::Error;

use crate::scan::Mode;

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Connection closed unexpectedly")]
    Closed,

    #[error("No endpoints to connect to")]
    NoEndpoints,

    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// RESP protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid RESP type byte: {0}")]
    InvalidType(u8),

    #[error("Invalid bulk string length: {0}")]
    InvalidLength(i64),

    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse { expected: String, actual: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Failure of a single query against one endpoint.
///
/// Probes never retry; the caller decides whether a failure is fatal.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Connection, authentication or timeout failure
    #[error("{endpoint} unreachable: {source}")]
    Unreachable {
        endpoint: String,
        source: ConnectionError,
    },

    /// The endpoint answered with something we could not interpret
    #[error("{endpoint} protocol error: {source}")]
    Protocol {
        endpoint: String,
        source: ProtocolError,
    },
}

impl ProbeError {
    pub fn unreachable(endpoint: impl ToString, source: ConnectionError) -> Self {
        ProbeError::Unreachable {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    pub fn protocol(endpoint: impl ToString, source: ProtocolError) -> Self {
        ProbeError::Protocol {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// Map an I/O failure during a probe: timeouts and resets count as
    /// unreachable, undecodable data as a protocol error.
    pub fn from_io(endpoint: impl ToString, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData => {
                ProbeError::protocol(endpoint, ProtocolError::Parse(err.to_string()))
            }
            io::ErrorKind::Other => {
                ProbeError::protocol(endpoint, ProtocolError::ServerError(err.to_string()))
            }
            io::ErrorKind::UnexpectedEof => ProbeError::unreachable(endpoint, ConnectionError::Closed),
            _ => ProbeError::unreachable(endpoint, ConnectionError::Io(err)),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ProbeError::Unreachable { .. })
    }
}

/// Deployment declaration problems that make a scan meaningless
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Deployment has no endpoints")]
    NoEndpoints,

    #[error("Server did not report redis_mode")]
    MissingMode,

    #[error("Unrecognized redis_mode: {0}")]
    UnrecognizedMode(String),

    #[error("Deployment declares {declared} but server reports {reported}")]
    ModeMismatch { declared: Mode, reported: Mode },

    #[error("Invalid endpoint '{0}': expected host:port")]
    InvalidEndpoint(String),

    #[error("{0}")]
    Invalid(String),
}

/// Scan-level abort. No snapshot is produced.
#[derive(Error, Debug)]
pub enum ScanAborted {
    #[error("Base info unavailable: {0}")]
    BaseInfoUnavailable(#[source] ProbeError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Cluster-related errors
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Failed to parse CLUSTER NODES response: {0}")]
    ParseFailed(String),

    #[error("No primary nodes found in cluster")]
    NoPrimaries,
}
