//! Transaction commit operation.
//!
//! Request body:
//!
//! ```text
//! (tx-id:int)(using-log:byte)
//! { (1:byte)(intent:byte)(cluster:short)(position:long)(record-type:byte)(content) }*
//! (0:byte)
//!
//! content: create -> (body:bytes)
//!          update -> (version:int)(body:bytes)
//!          delete -> (version:int)
//! ```
//!
//! Response body:
//!
//! ```text
//! (created-count:int){ (client rid)(server rid) }*
//! (updated-count:int){ (rid)(version:int) }*
//! ```

use crate::codec::{WireReader, WireWriter};
use crate::document::RecordType;
use crate::error::ProtocolError;
use crate::operation::{Operation, OperationType};
use crate::record::RecordSerializer;
use crate::rid::Rid;
use bytes::Bytes;
use std::fmt;

/// Kind of change staged for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordIntent {
    Update = 1,
    Delete = 2,
    Create = 3,
}

impl RecordIntent {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RecordIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIntent::Update => write!(f, "update"),
            RecordIntent::Delete => write!(f, "delete"),
            RecordIntent::Create => write!(f, "create"),
        }
    }
}

/// One record entry in a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub intent: RecordIntent,
    /// Identity as sent to the server; temporary for creates.
    pub rid: Rid,
    pub version: i32,
    pub record_type: RecordType,
    /// Serialized body; ignored for deletes.
    pub body: Bytes,
}

/// Commit request for a set of staged records.
#[derive(Debug, Clone)]
pub struct TransactionCommit {
    pub tx_id: i32,
    pub using_log: bool,
    pub entries: Vec<CommitEntry>,
}

/// Identities and versions assigned by the server on commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    /// Temporary identity as sent → persisted identity.
    pub created: Vec<(Rid, Rid)>,
    /// Identity → new version, for updated and created records.
    pub updated: Vec<(Rid, i32)>,
}

impl CommitResult {
    /// Writes the response body. Used by test servers and fixtures.
    pub fn write(&self, writer: &mut WireWriter) {
        writer.put_i32(self.created.len() as i32);
        for (client, server) in &self.created {
            client.encode(writer);
            server.encode(writer);
        }
        writer.put_i32(self.updated.len() as i32);
        for (rid, version) in &self.updated {
            rid.encode(writer);
            writer.put_i32(*version);
        }
    }
}

impl TransactionCommit {
    pub fn new(tx_id: i32, using_log: bool, entries: Vec<CommitEntry>) -> Self {
        Self {
            tx_id,
            using_log,
            entries,
        }
    }
}

impl Operation for TransactionCommit {
    type Output = CommitResult;

    fn operation_type(&self) -> OperationType {
        OperationType::TxCommit
    }

    fn write_body(&self, writer: &mut WireWriter) {
        writer.put_i32(self.tx_id).put_bool(self.using_log);

        for entry in &self.entries {
            writer.put_u8(1).put_u8(entry.intent.as_byte());
            entry.rid.encode(writer);
            writer.put_u8(entry.record_type.as_byte());

            match entry.intent {
                RecordIntent::Create => {
                    writer.put_bytes(&entry.body);
                }
                RecordIntent::Update => {
                    writer.put_i32(entry.version).put_bytes(&entry.body);
                }
                RecordIntent::Delete => {
                    writer.put_i32(entry.version);
                }
            }
        }

        writer.put_u8(0);
    }

    fn read_body(
        &self,
        reader: &mut WireReader<'_>,
        _serializer: &dyn RecordSerializer,
    ) -> Result<CommitResult, ProtocolError> {
        let created_count = reader.read_count()?;
        let mut created = Vec::with_capacity(created_count.min(self.entries.len()));
        for _ in 0..created_count {
            let client = Rid::decode(reader)?;
            let server = Rid::decode(reader)?;
            created.push((client, server));
        }

        let updated_count = reader.read_count()?;
        let mut updated = Vec::with_capacity(updated_count.min(self.entries.len()));
        for _ in 0..updated_count {
            let rid = Rid::decode(reader)?;
            let version = reader.read_i32()?;
            updated.push((rid, version));
        }

        tracing::debug!(
            tx_id = self.tx_id,
            created = created.len(),
            updated = updated.len(),
            "commit response"
        );
        Ok(CommitResult { created, updated })
    }
}
