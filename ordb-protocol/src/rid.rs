//! Record identities.

use crate::codec::{WireReader, WireWriter};
use crate::error::DecodeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Cluster id used when no cluster has been assigned.
pub const CLUSTER_ID_INVALID: i16 = -1;

/// Encoded size of a rid on the wire (cluster short + position long).
pub const RID_WIRE_SIZE: usize = 2 + 8;

/// Record identity: a (cluster id, position) pair.
///
/// Persisted records live in a cluster with a non-negative id. Records that
/// have not been committed yet carry a temporary identity with a negative
/// position. Text form is `#<cluster>:<position>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rid {
    pub cluster_id: i16,
    pub position: i64,
}

impl Rid {
    pub const fn new(cluster_id: i16, position: i64) -> Self {
        Self {
            cluster_id,
            position,
        }
    }

    /// Returns whether this identity addresses a stored record.
    pub fn is_persistent(&self) -> bool {
        self.cluster_id >= 0 && self.position >= 0
    }

    /// Returns whether this identity was allocated client-side.
    pub fn is_temporary(&self) -> bool {
        self.position < 0
    }

    /// Reads a rid from the cursor.
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let cluster_id = reader.read_i16()?;
        let position = reader.read_i64()?;
        Ok(Self::new(cluster_id, position))
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        writer.put_i16(self.cluster_id).put_i64(self.position);
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster_id, self.position)
    }
}

/// Error parsing a rid from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rid: {0:?}")]
pub struct ParseRidError(pub String);

impl FromStr for Rid {
    type Err = ParseRidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('#').unwrap_or(s);
        let (cluster, position) = body
            .split_once(':')
            .ok_or_else(|| ParseRidError(s.to_string()))?;
        let cluster_id = cluster
            .parse()
            .map_err(|_| ParseRidError(s.to_string()))?;
        let position = position
            .parse()
            .map_err(|_| ParseRidError(s.to_string()))?;
        Ok(Self::new(cluster_id, position))
    }
}

impl Serialize for Rid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
