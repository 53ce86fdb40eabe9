//! Client error types.

use ordb_mapping::MappingError;
use ordb_protocol::{ProtocolError, RecordIntent, Rid};
use thiserror::Error;

/// Failures reported by a [`Connection`](crate::Connection).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("not connected")]
    NotConnected,

    #[error("request timeout")]
    Timeout,
}

/// Staging rule broken by a transaction call. Raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("cannot create record with persisted identity {0}")]
    CreateWithPersistedIdentity(Rid),

    #[error("{intent} requires a record identity")]
    MissingIdentity { intent: RecordIntent },

    #[error("temporary identity {0} was not assigned by this transaction")]
    UnknownTemporaryIdentity(Rid),

    #[error("record {rid} is staged for {staged}, cannot stage for {requested}")]
    ConflictingIntent {
        rid: Rid,
        staged: RecordIntent,
        requested: RecordIntent,
    },

    #[error("cannot create a record without a class name")]
    MissingClass,
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("transaction invariant violated: {0}")]
    TransactionInvariant(#[from] InvariantViolation),

    #[error("no cluster known for class '{0}'")]
    UnknownClass(String),

    #[error("commit result refers to unstaged record {0}")]
    UnknownCommitIdentity(Rid),

    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl ClientError {
    /// Returns whether this error is retryable. The driver never retries on
    /// its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(
                TransportError::Io(_) | TransportError::ConnectionClosed | TransportError::Timeout
            )
        )
    }
}
