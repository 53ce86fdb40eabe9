//! Request header, response envelope, and the operation abstraction.
//!
//! Request layout:
//!
//! ```text
//! +-----------+------------+-----------------------+
//! | operation | session id | operation body        |
//! | 1 byte    | 4 bytes    | operation specific    |
//! +-----------+------------+-----------------------+
//! ```
//!
//! Response layout:
//!
//! ```text
//! +--------+------------+---------------------------------------------+
//! | status | session id | body (OK) / exception list (ERROR)          |
//! | 1 byte | 4 bytes    |                                             |
//! +--------+------------+---------------------------------------------+
//! ```
//!
//! The exception list is a sequence of `(1:byte)(class:string)(message:string)`
//! entries terminated by a `0` byte.

use crate::codec::{WireReader, WireWriter};
use crate::error::{DecodeError, ProtocolError, ServerException};
use crate::record::RecordSerializer;
use bytes::Bytes;

/// Size of the response envelope (status byte + session id).
pub const RESPONSE_HEADER_SIZE: usize = 1 + 4;

/// Operation discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationType {
    Command = 41,
    TxCommit = 60,
}

impl OperationType {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Envelope status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseStatus {
    Ok = 0,
    Error = 1,
}

impl ResponseStatus {
    pub fn from_byte(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(ResponseStatus::Ok),
            1 => Ok(ResponseStatus::Error),
            other => Err(DecodeError::UnknownResponseStatus(other)),
        }
    }
}

/// A request/response exchange.
pub trait Operation {
    /// Parsed response content.
    type Output;

    fn operation_type(&self) -> OperationType;

    /// Writes everything after the session id.
    fn write_body(&self, writer: &mut WireWriter);

    /// Parses the response body, starting right after the envelope.
    fn read_body(
        &self,
        reader: &mut WireReader<'_>,
        serializer: &dyn RecordSerializer,
    ) -> Result<Self::Output, ProtocolError>;

    /// Builds the complete request bytes.
    fn encode_request(&self, session_id: i32) -> Bytes {
        let mut writer = WireWriter::new();
        writer
            .put_u8(self.operation_type().as_byte())
            .put_i32(session_id);
        self.write_body(&mut writer);
        tracing::debug!(
            op = ?self.operation_type(),
            session_id,
            len = writer.len(),
            "encoded request"
        );
        writer.freeze()
    }

    /// Parses a complete raw response: envelope first, then the body.
    fn decode_response(
        &self,
        raw: &[u8],
        serializer: &dyn RecordSerializer,
    ) -> Result<Self::Output, ProtocolError> {
        let mut reader = WireReader::new(raw);
        let envelope = read_envelope(&mut reader)?;
        tracing::debug!(
            op = ?self.operation_type(),
            session_id = envelope.session_id,
            "response envelope ok"
        );
        self.read_body(&mut reader, serializer)
    }
}

/// A successfully decoded envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub session_id: i32,
}

/// Reads the envelope. An ERROR status is returned as [`ProtocolError::Server`].
pub fn read_envelope(reader: &mut WireReader<'_>) -> Result<Envelope, ProtocolError> {
    let status = ResponseStatus::from_byte(reader.read_u8()?)?;
    let session_id = reader.read_i32()?;

    match status {
        ResponseStatus::Ok => Ok(Envelope { session_id }),
        ResponseStatus::Error => {
            let mut exceptions = Vec::new();
            while reader.read_u8()? == 1 {
                let class = reader.read_string()?;
                let message = reader.read_string()?;
                exceptions.push(ServerException { class, message });
            }
            tracing::warn!(session_id, count = exceptions.len(), "server returned error");
            Err(ProtocolError::Server { exceptions })
        }
    }
}

/// Writes an OK envelope. Used by test servers and fixtures.
pub fn write_ok_envelope(writer: &mut WireWriter, session_id: i32) {
    writer.put_u8(ResponseStatus::Ok as u8).put_i32(session_id);
}

/// Writes an ERROR envelope with its exception list.
pub fn write_error_envelope(writer: &mut WireWriter, session_id: i32, exceptions: &[ServerException]) {
    writer.put_u8(ResponseStatus::Error as u8).put_i32(session_id);
    for exception in exceptions {
        writer
            .put_u8(1)
            .put_string(&exception.class)
            .put_string(&exception.message);
    }
    writer.put_u8(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let mut w = WireWriter::new();
        write_ok_envelope(&mut w, 77);
        w.put_u8(b'n');
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert_eq!(read_envelope(&mut r).unwrap(), Envelope { session_id: 77 });
        assert_eq!(r.position(), RESPONSE_HEADER_SIZE);
    }

    #[test]
    fn test_error_envelope() {
        let exceptions = vec![ServerException {
            class: "ORecordNotFoundException".to_string(),
            message: "#10:100 not found".to_string(),
        }];
        let mut w = WireWriter::new();
        write_error_envelope(&mut w, 3, &exceptions);
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        match read_envelope(&mut r) {
            Err(ProtocolError::Server { exceptions: parsed }) => assert_eq!(parsed, exceptions),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(r.is_exhausted());
    }

    #[test]
    fn test_unknown_envelope_status() {
        let bytes = [9u8, 0, 0, 0, 1];
        let mut r = WireReader::new(&bytes);
        assert!(matches!(
            read_envelope(&mut r),
            Err(ProtocolError::Decode(DecodeError::UnknownResponseStatus(9)))
        ));
    }

    #[test]
    fn test_operation_bytes() {
        assert_eq!(OperationType::Command.as_byte(), 41);
        assert_eq!(OperationType::TxCommit.as_byte(), 60);
    }
}
