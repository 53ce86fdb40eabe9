//! Protocol error types.

use crate::command::OperationMode;
use std::fmt;
use thiserror::Error;

/// Errors raised while reading wire bytes.
///
/// Any of these leaves the response cursor at an unknown position, so the
/// remainder of the response must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated buffer at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid UTF-8 in text at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("negative length {length} at offset {offset}")]
    NegativeLength { offset: usize, length: i32 },

    #[error("unknown record type {tag:#04x} at offset {offset}")]
    UnknownRecordType { offset: usize, tag: u8 },

    #[error("unknown response status: {0:#04x}")]
    UnknownResponseStatus(u8),
}

/// An exception entry reported by the server in an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerException {
    pub class: String,
    pub message: String,
}

impl fmt::Display for ServerException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

/// Protocol-level errors from building requests or parsing responses.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("unknown {mode} payload status: {status:#04x}")]
    UnknownStatus { mode: OperationMode, status: u8 },

    #[error("server error: {}", format_exceptions(.exceptions))]
    Server { exceptions: Vec<ServerException> },

    #[error("record serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_exceptions(exceptions: &[ServerException]) -> String {
    if exceptions.is_empty() {
        return "no details".to_string();
    }
    exceptions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProtocolError {
    /// Returns whether the error desynchronized the response cursor.
    ///
    /// Fatal errors abort the in-flight response; the connection should not
    /// be reused for another request until it is re-established.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProtocolError::Decode(_) | ProtocolError::UnknownStatus { .. }
        )
    }
}
