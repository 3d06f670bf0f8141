use std::path::PathBuf;
use thiserror::Error;
use tonic::Code;

/// Result type alias for the ImageStore client
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the ImageStore client
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough command-line arguments
    #[error("{0}")]
    Usage(String),

    /// A credential file could not be read, or was empty
    #[error("Failed to load credential {}: {source}", .path.display())]
    CredentialLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The secure channel could not be prepared
    #[error("Transport setup error: {0}")]
    TransportSetup(String),

    /// The remote store has no object under this key
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The remote store rejected the client certificate or the call
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other RPC failure (unavailable, deadline exceeded, TLS failure, ...)
    #[error("Transport error: {0}")]
    Transport(tonic::Status),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            Code::NotFound => Error::ObjectNotFound(status.message().to_string()),
            Code::PermissionDenied | Code::Unauthenticated => {
                Error::PermissionDenied(status.message().to_string())
            }
            _ => Error::Transport(status),
        }
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        Error::TransportSetup(err.to_string())
    }
}

impl Error {
    /// Whether the remote store reported the key as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ObjectNotFound(_))
    }
}
