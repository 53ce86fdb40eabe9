//! # ordb-protocol
//!
//! Binary wire protocol for ordb.
//!
//! This crate provides:
//! - Big-endian integer and length-prefixed text codec with an owned cursor
//! - Record identities and the generic document model
//! - Record unit decoding (null / reference / full record)
//! - Command and transaction-commit operations
//! - A pluggable record body format with a JSON implementation

pub mod codec;
pub mod command;
pub mod document;
pub mod error;
pub mod json;
pub mod operation;
pub mod record;
pub mod rid;
pub mod transaction;

pub use codec::{WireReader, WireWriter};
pub use command::{
    CommandClass, CommandContent, CommandOperation, CommandPayload, CommandResult, OperationMode,
    PayloadStatus,
};
pub use document::{Decimal, Document, RecordType, Value};
pub use error::{DecodeError, ProtocolError, ServerException};
pub use json::JsonRecordSerializer;
pub use operation::{Operation, OperationType};
pub use record::{parse_record, RecordHeader, RecordSerializer};
pub use rid::Rid;
pub use transaction::{CommitEntry, CommitResult, RecordIntent, TransactionCommit};

