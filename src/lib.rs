//! ordb - client-side engine for a multi-model document/graph database.
//!
//! Re-exports the workspace crates:
//! - [`protocol`]: wire codec, record parsing, command and commit operations
//! - [`mapping`]: typed objects to and from documents
//! - [`client`]: connections, transactions and the database facade

pub use ordb_client as client;
pub use ordb_mapping as mapping;
pub use ordb_protocol as protocol;

pub use ordb_client::{ClientError, Connection, Database, DriverConfig, Transaction};
pub use ordb_mapping::{Mapped, MappingError, TypeMapper};
pub use ordb_protocol::{Document, ProtocolError, Rid, Value};
