//! Decoding of single record units from a response.
//!
//! Each unit starts with a 16-bit discriminant:
//!
//! ```text
//! -2                       null: nothing follows
//! -3                       reference: (cluster:short)(position:long)
//! any other (class tag)    (record-type:byte)(cluster:short)(position:long)
//!                          (version:int)(length:int)(body: length bytes)
//! ```

use crate::codec::{WireReader, WireWriter};
use crate::document::{Document, RecordType};
use crate::error::{DecodeError, ProtocolError};
use crate::rid::Rid;

/// Discriminant for an absent record.
pub const NULL_RECORD: i16 = -2;

/// Discriminant for a bare identity reference.
pub const RID_ONLY_RECORD: i16 = -3;

/// Metadata that precedes a record body on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub rid: Rid,
    pub version: i32,
    pub record_type: RecordType,
    pub class_id: i16,
}

/// Converts record bodies to and from documents.
///
/// The body format is independent of the framing; implementations are
/// plugged into the parser and into commit encoding.
pub trait RecordSerializer: Send + Sync {
    /// Builds a document from a raw body and its header.
    fn deserialize(&self, header: RecordHeader, raw: &[u8]) -> Result<Document, ProtocolError>;

    /// Encodes the fields of `document` into a raw body.
    fn serialize(&self, document: &Document) -> Result<Vec<u8>, ProtocolError>;
}

/// Decodes exactly one unit at the reader's cursor.
///
/// Returns `Ok(None)` for the null discriminant, a field-less document for an
/// identity reference, and a deserialized document otherwise.
pub fn parse_record(
    reader: &mut WireReader<'_>,
    serializer: &dyn RecordSerializer,
) -> Result<Option<Document>, ProtocolError> {
    let start = reader.position();
    let class_id = reader.read_i16()?;

    match class_id {
        NULL_RECORD => {
            tracing::trace!(offset = start, "null record");
            Ok(None)
        }
        RID_ONLY_RECORD => {
            let rid = Rid::decode(reader)?;
            tracing::trace!(offset = start, %rid, "record reference");
            Ok(Some(Document::reference(rid, class_id)))
        }
        _ => {
            let type_offset = reader.position();
            let tag = reader.read_u8()?;
            let record_type = RecordType::try_from(tag).map_err(|_| {
                DecodeError::UnknownRecordType {
                    offset: type_offset,
                    tag,
                }
            })?;
            let rid = Rid::decode(reader)?;
            let version = reader.read_i32()?;
            let body = reader.read_bytes()?;
            tracing::trace!(
                offset = start,
                %rid,
                version,
                body_len = body.len(),
                "record"
            );

            let header = RecordHeader {
                rid,
                version,
                record_type,
                class_id,
            };
            serializer.deserialize(header, body).map(Some)
        }
    }
}

/// Writes one full record unit. Inverse of [`parse_record`] for tests and tools.
pub fn write_record(
    writer: &mut WireWriter,
    document: &Document,
    serializer: &dyn RecordSerializer,
) -> Result<(), ProtocolError> {
    let body = serializer.serialize(document)?;
    let rid = document.rid.unwrap_or_default();
    writer
        .put_i16(document.class_id)
        .put_u8(document.record_type.as_byte());
    rid.encode(writer);
    writer.put_i32(document.version).put_bytes(&body);
    Ok(())
}

/// Writes the null discriminant.
pub fn write_null(writer: &mut WireWriter) {
    writer.put_i16(NULL_RECORD);
}

/// Writes an identity-only reference unit.
pub fn write_reference(writer: &mut WireWriter, rid: Rid) {
    writer.put_i16(RID_ONLY_RECORD);
    rid.encode(writer);
}
