//! Connection abstraction.
//!
//! Socket handling, pooling and the authentication handshake live outside
//! this crate. A [`Connection`] only has to deliver one complete request and
//! return the matching complete response, in strict lock step.

use crate::error::{ClientError, TransportError};
use bytes::Bytes;
use ordb_protocol::{Operation, RecordSerializer};
use std::future::Future;

/// An open session with the server.
pub trait Connection: Send + Sync {
    /// Session id written in every request header.
    fn session_id(&self) -> i32;

    /// Sends a complete request and returns the complete raw response,
    /// starting at the envelope status byte.
    fn send(&self, request: Bytes) -> impl Future<Output = Result<Bytes, TransportError>> + Send;

    /// Returns the cluster new records of `class_name` are stored in.
    fn resolve_cluster_for_class(&self, class_name: &str) -> Option<i16>;
}

/// Runs one operation over `conn`: encode, round trip, decode.
pub async fn execute_operation<C, O>(
    conn: &C,
    op: &O,
    serializer: &dyn RecordSerializer,
) -> Result<O::Output, ClientError>
where
    C: Connection,
    O: Operation + Sync,
{
    let request = op.encode_request(conn.session_id());
    let response = conn.send(request).await.map_err(|e| {
        tracing::debug!(op = ?op.operation_type(), "request failed: {}", e);
        e
    })?;
    Ok(op.decode_response(&response, serializer)?)
}
