//! Command operation: queries, mutating statements, and scripts.
//!
//! Request body (after operation byte and session id):
//!
//! ```text
//! (mode:byte)(length:int)(class-name:string)[(language:string)]
//! (text:string)(limit:int)(fetch-plan:string)(params:int = 0)
//! ```
//!
//! `length` covers class name, limit, text, fetch plan and the params marker.
//! The script language string that follows the class name for scripts is
//! not included in it.
//!
//! Synchronous response body is a single payload status followed by content:
//!
//! ```text
//! 'n'  nothing
//! 'r'  one record unit
//! 'a'  (length:int)(bytes) opaque serialized text
//! 'l'  (count:int) then count record units
//! ```
//!
//! Asynchronous response body is a stream of `(status:byte)(record unit)`
//! pairs where status is 1 (result set) or 2 (pre-fetched), terminated by a
//! 0 status.

use crate::codec::{encoded_text_len, WireReader, WireWriter, LEN_PREFIX_SIZE};
use crate::document::Document;
use crate::error::ProtocolError;
use crate::operation::{Operation, OperationType};
use crate::record::{parse_record, RecordSerializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side handler for read-only queries.
pub const QUERY_CLASS_NAME: &str = "com.orientechnologies.orient.core.sql.query.OSQLSynchQuery";
/// Server-side handler for mutating statements.
pub const COMMAND_CLASS_NAME: &str = "com.orientechnologies.orient.core.sql.OCommandSQL";
/// Server-side handler for scripts.
pub const SCRIPT_CLASS_NAME: &str = "com.orientechnologies.orient.core.command.script.OCommandScript";

/// Fetch plan that loads only the top-level records.
pub const DEFAULT_FETCH_PLAN: &str = "*:0";

/// Limit value meaning "no limit".
pub const NO_LIMIT: i32 = -1;

/// Script language used when none is given.
pub const DEFAULT_SCRIPT_LANGUAGE: &str = "sql";

/// Marker written in place of serialized parameters.
const PARAMS_DISABLED: i32 = 0;

/// How the server streams results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    #[default]
    Synchronous,
    Asynchronous,
}

impl OperationMode {
    pub fn as_byte(self) -> u8 {
        match self {
            OperationMode::Synchronous => b's',
            OperationMode::Asynchronous => b'a',
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Synchronous => write!(f, "synchronous"),
            OperationMode::Asynchronous => write!(f, "asynchronous"),
        }
    }
}

impl std::str::FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(OperationMode::Synchronous),
            "async" | "asynchronous" => Ok(OperationMode::Asynchronous),
            other => Err(format!("unknown operation mode: {}", other)),
        }
    }
}

/// Category of command, selecting the server-side handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandClass {
    /// Read-only, e.g. `select`.
    Idempotent,
    /// Mutating, e.g. `insert`.
    NonIdempotent,
    Script,
}

impl CommandClass {
    pub fn class_name(self) -> &'static str {
        match self {
            CommandClass::Idempotent => QUERY_CLASS_NAME,
            CommandClass::NonIdempotent => COMMAND_CLASS_NAME,
            CommandClass::Script => SCRIPT_CLASS_NAME,
        }
    }
}

/// Text and options of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPayload {
    pub text: String,
    pub fetch_plan: String,
    /// Limit applied to non-text results.
    pub non_text_limit: i32,
    /// Script language; only sent for [`CommandClass::Script`].
    pub language: Option<String>,
}

impl CommandPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fetch_plan: DEFAULT_FETCH_PLAN.to_string(),
            non_text_limit: NO_LIMIT,
            language: None,
        }
    }

    pub fn with_fetch_plan(mut self, fetch_plan: impl Into<String>) -> Self {
        self.fetch_plan = fetch_plan.into();
        self
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.non_text_limit = limit;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Payload status codes. Synchronous and asynchronous codes never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PayloadStatus {
    NoRemainingRecords = 0,
    ResultSet = 1,
    PreFetched = 2,
    SerializedResult = b'a',
    RecordCollection = b'l',
    NullResult = b'n',
    SingleRecord = b'r',
}

impl PayloadStatus {
    /// Interprets a status byte within the code space of `mode`.
    pub fn from_byte(mode: OperationMode, status: u8) -> Result<Self, ProtocolError> {
        let parsed = match (mode, status) {
            (OperationMode::Synchronous, b'n') => PayloadStatus::NullResult,
            (OperationMode::Synchronous, b'r') => PayloadStatus::SingleRecord,
            (OperationMode::Synchronous, b'a') => PayloadStatus::SerializedResult,
            (OperationMode::Synchronous, b'l') => PayloadStatus::RecordCollection,
            (OperationMode::Asynchronous, 0) => PayloadStatus::NoRemainingRecords,
            (OperationMode::Asynchronous, 1) => PayloadStatus::ResultSet,
            (OperationMode::Asynchronous, 2) => PayloadStatus::PreFetched,
            _ => {
                tracing::warn!(%mode, status, "unknown payload status");
                return Err(ProtocolError::UnknownStatus { mode, status });
            }
        };
        Ok(parsed)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Decoded content of a command response.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandContent {
    /// No content (null result, or a single null record).
    None,
    Record(Document),
    /// Opaque serialized result text.
    Serialized(String),
    Records(Vec<Document>),
}

/// Result of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// First status read from the body.
    pub status: PayloadStatus,
    pub content: CommandContent,
}

impl CommandResult {
    /// Returns the documents in the result, in response order.
    pub fn documents(&self) -> Vec<&Document> {
        match &self.content {
            CommandContent::Record(doc) => vec![doc],
            CommandContent::Records(docs) => docs.iter().collect(),
            CommandContent::None | CommandContent::Serialized(_) => Vec::new(),
        }
    }

    pub fn into_documents(self) -> Vec<Document> {
        match self.content {
            CommandContent::Record(doc) => vec![doc],
            CommandContent::Records(docs) => docs,
            CommandContent::None | CommandContent::Serialized(_) => Vec::new(),
        }
    }

    pub fn serialized(&self) -> Option<&str> {
        match &self.content {
            CommandContent::Serialized(text) => Some(text),
            _ => None,
        }
    }
}

/// A command request and the parser for its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOperation {
    pub mode: OperationMode,
    pub class: CommandClass,
    pub payload: CommandPayload,
}

impl CommandOperation {
    pub fn new(mode: OperationMode, class: CommandClass, payload: CommandPayload) -> Self {
        Self {
            mode,
            class,
            payload,
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self::new(
            OperationMode::Synchronous,
            CommandClass::Idempotent,
            CommandPayload::new(text),
        )
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(
            OperationMode::Synchronous,
            CommandClass::NonIdempotent,
            CommandPayload::new(text),
        )
    }

    pub fn script(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            OperationMode::Synchronous,
            CommandClass::Script,
            CommandPayload::new(text).with_language(language),
        )
    }

    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Value of the length field: everything after it except the script
    /// language string.
    // TODO: unverified whether scripts should count the language string;
    // confirm against a reference server.
    pub fn declared_length(&self) -> i32 {
        let class_name = self.class.class_name();
        (encoded_text_len(class_name)
            + LEN_PREFIX_SIZE
            + encoded_text_len(&self.payload.text)
            + encoded_text_len(&self.payload.fetch_plan)
            + LEN_PREFIX_SIZE) as i32
    }

    fn script_language(&self) -> &str {
        self.payload
            .language
            .as_deref()
            .unwrap_or(DEFAULT_SCRIPT_LANGUAGE)
    }

    fn read_sync(
        &self,
        reader: &mut WireReader<'_>,
        status: PayloadStatus,
        serializer: &dyn RecordSerializer,
    ) -> Result<CommandContent, ProtocolError> {
        let content = match status {
            PayloadStatus::NullResult => CommandContent::None,
            PayloadStatus::SingleRecord => match parse_record(reader, serializer)? {
                Some(doc) => CommandContent::Record(doc),
                None => CommandContent::None,
            },
            PayloadStatus::SerializedResult => {
                let raw = reader.read_bytes()?;
                CommandContent::Serialized(String::from_utf8_lossy(raw).into_owned())
            }
            PayloadStatus::RecordCollection => {
                let count = reader.read_count()?;
                let mut docs = Vec::with_capacity(count.min(reader.remaining() / 2));
                for _ in 0..count {
                    if let Some(doc) = parse_record(reader, serializer)? {
                        docs.push(doc);
                    }
                }
                CommandContent::Records(docs)
            }
            other => {
                return Err(ProtocolError::UnknownStatus {
                    mode: OperationMode::Synchronous,
                    status: other.as_byte(),
                })
            }
        };
        Ok(content)
    }

    fn read_async(
        &self,
        reader: &mut WireReader<'_>,
        first: PayloadStatus,
        serializer: &dyn RecordSerializer,
    ) -> Result<CommandContent, ProtocolError> {
        let mut docs = Vec::new();
        let mut prefetched = 0usize;
        let mut status = first;

        while status != PayloadStatus::NoRemainingRecords {
            let doc = parse_record(reader, serializer)?;
            if status == PayloadStatus::PreFetched {
                prefetched += 1;
            }
            if let Some(doc) = doc {
                docs.push(doc);
            }
            status = PayloadStatus::from_byte(OperationMode::Asynchronous, reader.read_u8()?)?;
        }

        tracing::debug!(records = docs.len(), prefetched, "async command stream complete");
        Ok(CommandContent::Records(docs))
    }
}

impl Operation for CommandOperation {
    type Output = CommandResult;

    fn operation_type(&self) -> OperationType {
        OperationType::Command
    }

    fn write_body(&self, writer: &mut WireWriter) {
        writer
            .put_u8(self.mode.as_byte())
            .put_i32(self.declared_length())
            .put_string(self.class.class_name());

        if self.class == CommandClass::Script {
            writer.put_string(self.script_language());
        }

        writer
            .put_string(&self.payload.text)
            .put_i32(self.payload.non_text_limit)
            .put_string(&self.payload.fetch_plan)
            .put_i32(PARAMS_DISABLED);
    }

    fn read_body(
        &self,
        reader: &mut WireReader<'_>,
        serializer: &dyn RecordSerializer,
    ) -> Result<CommandResult, ProtocolError> {
        let status = PayloadStatus::from_byte(self.mode, reader.read_u8()?)?;
        tracing::debug!(mode = %self.mode, ?status, "command payload status");

        let content = match self.mode {
            OperationMode::Synchronous => self.read_sync(reader, status, serializer)?,
            OperationMode::Asynchronous => self.read_async(reader, status, serializer)?,
        };
        Ok(CommandResult { status, content })
    }
}
