//! Transaction staging and commit.
//!
//! A [`Transaction`] records create, update and delete intents keyed by
//! record identity and sends them to the server in a single commit request.
//!
//! New records get a temporary identity when staged: the configured sentinel
//! cluster id and a position counting down from -1. The cluster the record
//! will actually be stored in is resolved from its class at the same time and
//! is what goes on the wire, together with the temporary position.
//!
//! After a successful commit the server-assigned identities and versions are
//! written back onto the staged records. Nothing is written back if the
//! commit fails or its result names a record that was never staged.

use crate::config::TransactionConfig;
use crate::connection::{execute_operation, Connection};
use crate::error::{ClientError, InvariantViolation};
use bytes::Bytes;
use ordb_mapping::{to_document, to_object, Mapped};
use ordb_protocol::{
    CommitEntry, CommitResult, Document, ProtocolError, RecordIntent, RecordSerializer, Rid,
    TransactionCommit,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A staged change.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    intent: RecordIntent,
    rid: Rid,
    target_cluster: i16,
    document: Document,
}

impl TransactionRecord {
    pub fn intent(&self) -> RecordIntent {
        self.intent
    }

    /// Identity the record is staged under. Temporary for uncommitted creates.
    pub fn rid(&self) -> Rid {
        self.rid
    }

    pub fn version(&self) -> i32 {
        self.document.version
    }

    /// Cluster the record is stored in.
    pub fn target_cluster(&self) -> i16 {
        self.target_cluster
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Identity sent to the server.
    fn wire_rid(&self) -> Rid {
        if self.rid.is_persistent() {
            self.rid
        } else {
            Rid::new(self.target_cluster, self.rid.position)
        }
    }
}

/// Staged changes bound to one connection.
///
/// Not meant to be shared between tasks; staging takes `&mut self`.
pub struct Transaction<'c, C> {
    conn: &'c C,
    serializer: Arc<dyn RecordSerializer>,
    tx_id: i32,
    temp_cluster_id: i16,
    using_log: bool,
    /// Last temporary position handed out; 0 before the first create.
    last_position: i64,
    records: Vec<TransactionRecord>,
    index: HashMap<Rid, usize>,
}

impl<'c, C: Connection> Transaction<'c, C> {
    pub fn new(
        conn: &'c C,
        serializer: Arc<dyn RecordSerializer>,
        config: &TransactionConfig,
        tx_id: i32,
    ) -> Self {
        Self {
            conn,
            serializer,
            tx_id,
            temp_cluster_id: config.temp_cluster_id,
            using_log: config.using_log,
            last_position: 0,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn tx_id(&self) -> i32 {
        self.tx_id
    }

    /// Stages `document` with the given intent and returns the identity it
    /// is staged under.
    ///
    /// Creates must carry no identity or one assigned by this transaction; a
    /// temporary one is assigned. Updates and deletes must carry a persisted
    /// identity or one assigned by this transaction. Staging an identity
    /// again with the same intent replaces its document; with another intent
    /// it fails.
    pub fn stage(
        &mut self,
        intent: RecordIntent,
        rid: Option<Rid>,
        mut document: Document,
    ) -> Result<Rid, ClientError> {
        let rid = match rid {
            Some(rid) => rid,
            None if intent == RecordIntent::Create => return self.stage_create(document),
            None => return Err(InvariantViolation::MissingIdentity { intent }.into()),
        };
        if intent == RecordIntent::Create && rid.is_persistent() {
            return Err(InvariantViolation::CreateWithPersistedIdentity(rid).into());
        }

        if let Some(pos) = self.find(rid) {
            return self.restage(pos, intent, document);
        }

        match intent {
            RecordIntent::Create if rid.cluster_id >= 0 => {
                Err(InvariantViolation::CreateWithPersistedIdentity(rid).into())
            }
            RecordIntent::Create => Err(InvariantViolation::UnknownTemporaryIdentity(rid).into()),
            _ if !rid.is_persistent() => {
                Err(InvariantViolation::UnknownTemporaryIdentity(rid).into())
            }
            _ => {
                document.rid = Some(rid);
                self.push(TransactionRecord {
                    intent,
                    rid,
                    target_cluster: rid.cluster_id,
                    document,
                });
                tracing::debug!(tx_id = self.tx_id, %rid, %intent, "staged record");
                Ok(rid)
            }
        }
    }

    fn restage(
        &mut self,
        pos: usize,
        intent: RecordIntent,
        mut document: Document,
    ) -> Result<Rid, ClientError> {
        let staged = &self.records[pos];
        if staged.intent != intent {
            return Err(InvariantViolation::ConflictingIntent {
                rid: staged.rid,
                staged: staged.intent,
                requested: intent,
            }
            .into());
        }

        let target_cluster = if intent == RecordIntent::Create {
            document.version = 0;
            self.cluster_for(&document)?
        } else {
            staged.target_cluster
        };

        let record = &mut self.records[pos];
        document.rid = Some(record.rid);
        record.document = document;
        record.target_cluster = target_cluster;
        tracing::debug!(tx_id = self.tx_id, rid = %record.rid, %intent, "replaced staged record");
        Ok(record.rid)
    }

    fn cluster_for(&self, document: &Document) -> Result<i16, ClientError> {
        let class_name = document
            .class_name
            .as_deref()
            .ok_or(InvariantViolation::MissingClass)?;
        self.conn
            .resolve_cluster_for_class(class_name)
            .ok_or_else(|| ClientError::UnknownClass(class_name.to_string()))
    }

    fn stage_create(&mut self, mut document: Document) -> Result<Rid, ClientError> {
        let cluster = self.cluster_for(&document)?;

        self.last_position -= 1;
        let rid = Rid::new(self.temp_cluster_id, self.last_position);
        document.rid = Some(rid);
        document.version = 0;
        self.push(TransactionRecord {
            intent: RecordIntent::Create,
            rid,
            target_cluster: cluster,
            document,
        });
        tracing::debug!(tx_id = self.tx_id, %rid, cluster, "staged create");
        Ok(rid)
    }

    fn push(&mut self, record: TransactionRecord) {
        self.index.insert(record.rid, self.records.len());
        self.records.push(record);
    }

    /// Stages a new record.
    pub fn add(&mut self, document: Document) -> Result<Rid, ClientError> {
        let rid = document.rid;
        self.stage(RecordIntent::Create, rid, document)
    }

    /// Stages an update of the record identified by `document.rid`.
    pub fn update(&mut self, document: Document) -> Result<Rid, ClientError> {
        let rid = document.rid;
        self.stage(RecordIntent::Update, rid, document)
    }

    /// Stages a delete of the record identified by `document.rid`.
    pub fn delete(&mut self, document: Document) -> Result<Rid, ClientError> {
        let rid = document.rid;
        self.stage(RecordIntent::Delete, rid, document)
    }

    pub fn add_object<T: Mapped>(&mut self, object: &T) -> Result<Rid, ClientError> {
        self.add(to_document(object)?)
    }

    pub fn update_object<T: Mapped>(&mut self, object: &T) -> Result<Rid, ClientError> {
        self.update(to_document(object)?)
    }

    pub fn delete_object<T: Mapped>(&mut self, object: &T) -> Result<Rid, ClientError> {
        self.delete(to_document(object)?)
    }

    /// Looks up a staged record by the identity it is staged under or the
    /// identity it is sent as.
    pub fn get(&self, rid: Rid) -> Option<&TransactionRecord> {
        self.find(rid).map(|pos| &self.records[pos])
    }

    /// Maps a staged record's current document onto `T`.
    pub fn object<T: Mapped>(&self, rid: Rid) -> Result<Option<T>, ClientError> {
        Ok(self
            .get(rid)
            .map(|record| to_object(&record.document))
            .transpose()?)
    }

    /// Staged records in staging order.
    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops all staged records and restarts temporary numbering.
    pub fn reset(&mut self) {
        self.records.clear();
        self.index.clear();
        self.last_position = 0;
    }

    fn find(&self, rid: Rid) -> Option<usize> {
        if let Some(&pos) = self.index.get(&rid) {
            return Some(pos);
        }
        if rid.is_persistent() {
            return None;
        }
        self.records
            .iter()
            .position(|r| !r.rid.is_persistent() && r.wire_rid() == rid)
    }

    fn entry(&self, record: &TransactionRecord) -> Result<CommitEntry, ProtocolError> {
        let body = match record.intent {
            RecordIntent::Delete => Bytes::new(),
            RecordIntent::Create | RecordIntent::Update => {
                Bytes::from(self.serializer.serialize(&record.document)?)
            }
        };
        Ok(CommitEntry {
            intent: record.intent,
            rid: record.wire_rid(),
            version: record.document.version,
            record_type: record.document.record_type,
            body,
        })
    }

    /// Sends every staged record in one commit request and applies the
    /// assigned identities and versions. Staged records are kept; call
    /// [`reset`](Self::reset) to start over.
    pub async fn commit(&mut self) -> Result<CommitResult, ClientError> {
        let entries = self
            .records
            .iter()
            .map(|record| self.entry(record))
            .collect::<Result<Vec<_>, _>>()?;
        let op = TransactionCommit::new(self.tx_id, self.using_log, entries);

        tracing::debug!(
            tx_id = self.tx_id,
            records = self.records.len(),
            "committing transaction"
        );
        let result = execute_operation(self.conn, &op, self.serializer.as_ref()).await?;
        self.apply(&result)?;
        Ok(result)
    }

    fn apply(&mut self, result: &CommitResult) -> Result<(), ClientError> {
        let mut created = Vec::with_capacity(result.created.len());
        for &(client, server) in &result.created {
            let pos = self
                .find(client)
                .ok_or(ClientError::UnknownCommitIdentity(client))?;
            created.push((pos, server));
        }

        // Versions are keyed by the identity after the created mapping.
        let mut versions = Vec::with_capacity(result.updated.len());
        for &(rid, version) in &result.updated {
            let pos = created
                .iter()
                .find(|(_, server)| *server == rid)
                .map(|(pos, _)| *pos)
                .or_else(|| self.find(rid))
                .ok_or(ClientError::UnknownCommitIdentity(rid))?;
            versions.push((pos, version));
        }

        for (pos, server) in created {
            let record = &mut self.records[pos];
            self.index.remove(&record.rid);
            tracing::debug!(tx_id = self.tx_id, from = %record.rid, to = %server, "record persisted");
            record.rid = server;
            record.target_cluster = server.cluster_id;
            record.document.rid = Some(server);
            self.index.insert(server, pos);
        }
        for (pos, version) in versions {
            self.records[pos].document.version = version;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::ScriptedConnection;
    use crate::error::TransportError;
    use ordb_mapping::TypeMapper;
    use ordb_protocol::codec::{WireReader, WireWriter};
    use ordb_protocol::operation::write_ok_envelope;
    use ordb_protocol::{JsonRecordSerializer, Value};
    use proptest::prelude::*;

    fn connection() -> ScriptedConnection {
        ScriptedConnection::new(7).with_cluster("V", 10)
    }

    fn transaction(conn: &ScriptedConnection) -> Transaction<'_, ScriptedConnection> {
        Transaction::new(
            conn,
            Arc::new(JsonRecordSerializer),
            &TransactionConfig::default(),
            1,
        )
    }

    fn vertex(name: &str) -> Document {
        Document::with_class("V").with_field("name", name)
    }

    fn commit_response(result: &CommitResult) -> Bytes {
        let mut w = WireWriter::new();
        write_ok_envelope(&mut w, 7);
        result.write(&mut w);
        w.freeze()
    }

    #[test]
    fn test_temporary_identities() {
        let conn = connection();
        let mut tx = transaction(&conn);

        assert_eq!(tx.add(vertex("a")).unwrap(), Rid::new(-1, -1));
        assert_eq!(tx.add(vertex("b")).unwrap(), Rid::new(-1, -2));
        assert_eq!(tx.add(vertex("c")).unwrap(), Rid::new(-1, -3));

        let record = tx.get(Rid::new(-1, -2)).unwrap();
        assert_eq!(record.target_cluster(), 10);
        assert_eq!(record.document().rid, Some(Rid::new(-1, -2)));
        assert_eq!(tx.get(Rid::new(10, -2)).unwrap().rid(), Rid::new(-1, -2));
    }

    #[test]
    fn test_custom_sentinel() {
        let conn = connection();
        let config = TransactionConfig {
            temp_cluster_id: -5,
            using_log: false,
        };
        let mut tx = Transaction::new(&conn, Arc::new(JsonRecordSerializer), &config, 1);
        assert_eq!(tx.add(vertex("a")).unwrap(), Rid::new(-5, -1));
    }

    #[test]
    fn test_identity_invariants() {
        let conn = connection();
        let mut tx = transaction(&conn);

        let err = tx.update(vertex("a")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::MissingIdentity {
                intent: RecordIntent::Update
            })
        ));
        let err = tx.delete(vertex("a")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::MissingIdentity { .. })
        ));

        let err = tx.add(vertex("a").with_rid(Rid::new(10, 4))).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::CreateWithPersistedIdentity(_))
        ));

        let err = tx.update(vertex("a").with_rid(Rid::new(-1, -9))).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::UnknownTemporaryIdentity(_))
        ));

        let err = tx.add(Document::new()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::MissingClass)
        ));

        let err = tx.add(Document::with_class("E")).unwrap_err();
        assert!(matches!(err, ClientError::UnknownClass(ref c) if c == "E"));

        assert!(tx.is_empty());
        assert_eq!(tx.add(vertex("a")).unwrap(), Rid::new(-1, -1));
    }

    #[test]
    fn test_restage_same_intent_replaces() {
        let conn = connection();
        let mut tx = transaction(&conn);
        let rid = Rid::new(10, 4);

        tx.update(vertex("a").with_rid(rid).with_version(2)).unwrap();
        tx.update(vertex("b").with_rid(rid).with_version(2)).unwrap();
        assert_eq!(tx.len(), 1);
        assert_eq!(
            tx.get(rid).unwrap().document().get_field("name"),
            Some(&Value::from("b"))
        );

        let temp = tx.add(vertex("c")).unwrap();
        tx.stage(RecordIntent::Create, Some(temp), vertex("d")).unwrap();
        assert_eq!(tx.len(), 2);
        assert_eq!(
            tx.get(temp).unwrap().document().get_field("name"),
            Some(&Value::from("d"))
        );
    }

    #[test]
    fn test_create_rejects_foreign_identity() {
        let conn = connection();
        let mut tx = transaction(&conn);

        let err = tx.add(vertex("a").with_rid(Rid::new(10, -5))).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::CreateWithPersistedIdentity(rid))
                if rid == Rid::new(10, -5)
        ));

        let err = tx.add(vertex("a").with_rid(Rid::new(-1, -3))).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::UnknownTemporaryIdentity(_))
        ));
        assert!(tx.is_empty());

        let temp = tx.add(vertex("b")).unwrap();
        assert_eq!(temp, Rid::new(-1, -1));
        assert_eq!(tx.add(vertex("c").with_rid(Rid::new(10, -1))).unwrap(), temp);
        assert_eq!(tx.len(), 1);
    }

    #[test]
    fn test_restage_create_resolves_new_class() {
        let conn = connection().with_cluster("E", 12);
        let mut tx = transaction(&conn);

        let temp = tx.add(vertex("a")).unwrap();
        assert_eq!(tx.get(temp).unwrap().target_cluster(), 10);

        let edge = Document::with_class("E").with_version(4);
        tx.stage(RecordIntent::Create, Some(temp), edge).unwrap();
        let record = tx.get(temp).unwrap();
        assert_eq!(record.target_cluster(), 12);
        assert_eq!(record.version(), 0);
        assert_eq!(record.document().class_name.as_deref(), Some("E"));
        assert!(tx.get(Rid::new(12, -1)).is_some());

        let err = tx
            .stage(RecordIntent::Create, Some(temp), Document::with_class("X"))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownClass(ref c) if c == "X"));
        assert_eq!(tx.get(temp).unwrap().target_cluster(), 12);
    }

    #[test]
    fn test_restage_other_intent_conflicts() {
        let conn = connection();
        let mut tx = transaction(&conn);
        let rid = Rid::new(10, 4);

        tx.update(vertex("a").with_rid(rid)).unwrap();
        let err = tx.delete(vertex("a").with_rid(rid)).unwrap_err();
        match err {
            ClientError::TransactionInvariant(InvariantViolation::ConflictingIntent {
                rid: conflict,
                staged,
                requested,
            }) => {
                assert_eq!(conflict, rid);
                assert_eq!(staged, RecordIntent::Update);
                assert_eq!(requested, RecordIntent::Delete);
            }
            other => panic!("unexpected error: {other}"),
        }

        let temp = tx.add(vertex("b")).unwrap();
        assert!(tx.delete(vertex("b").with_rid(temp)).is_err());
        assert_eq!(tx.get(temp).unwrap().intent(), RecordIntent::Create);
    }

    #[tokio::test]
    async fn test_commit_applies_identities_and_versions() {
        let conn = connection();
        let mut tx = transaction(&conn);
        let temp = tx.add(vertex("a")).unwrap();
        assert_eq!(temp, Rid::new(-1, -1));

        let result = CommitResult {
            created: vec![(Rid::new(-1, -1), Rid::new(10, 100))],
            updated: vec![(Rid::new(10, 100), 1)],
        };
        conn.respond(commit_response(&result));

        let applied = tx.commit().await.unwrap();
        assert_eq!(applied, result);

        let record = tx.records().next().unwrap();
        assert_eq!(record.rid(), Rid::new(10, 100));
        assert_eq!(record.version(), 1);
        assert_eq!(record.document().rid, Some(Rid::new(10, 100)));
        assert!(tx.get(temp).is_none());
        assert_eq!(tx.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_request_layout() {
        let conn = connection();
        let mut tx = transaction(&conn);
        tx.add(vertex("a")).unwrap();
        tx.update(vertex("b").with_rid(Rid::new(10, 4)).with_version(3))
            .unwrap();
        tx.delete(Document::new().with_rid(Rid::new(11, 9)).with_version(2))
            .unwrap();

        // The server echoes the identity it was sent.
        let result = CommitResult {
            created: vec![(Rid::new(10, -1), Rid::new(10, 100))],
            updated: vec![(Rid::new(10, 100), 1), (Rid::new(10, 4), 4)],
        };
        conn.respond(commit_response(&result));
        tx.commit().await.unwrap();

        let requests = conn.requests();
        let mut r = WireReader::new(&requests[0]);
        assert_eq!(r.read_u8().unwrap(), 60);
        assert_eq!(r.read_i32().unwrap(), 7);
        assert_eq!(r.read_i32().unwrap(), 1);
        assert!(r.read_bool().unwrap());

        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u8().unwrap(), RecordIntent::Create.as_byte());
        assert_eq!(Rid::decode(&mut r).unwrap(), Rid::new(10, -1));
        assert_eq!(r.read_u8().unwrap(), b'd');
        assert!(!r.read_bytes().unwrap().is_empty());

        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u8().unwrap(), RecordIntent::Update.as_byte());
        assert_eq!(Rid::decode(&mut r).unwrap(), Rid::new(10, 4));
        assert_eq!(r.read_u8().unwrap(), b'd');
        assert_eq!(r.read_i32().unwrap(), 3);
        r.read_bytes().unwrap();

        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u8().unwrap(), RecordIntent::Delete.as_byte());
        assert_eq!(Rid::decode(&mut r).unwrap(), Rid::new(11, 9));
        assert_eq!(r.read_u8().unwrap(), b'd');
        assert_eq!(r.read_i32().unwrap(), 2);
        assert_eq!(r.read_u8().unwrap(), 0);
        assert!(r.is_exhausted());

        assert_eq!(tx.get(Rid::new(10, 100)).unwrap().version(), 1);
        assert_eq!(tx.get(Rid::new(10, 4)).unwrap().version(), 4);
        assert_eq!(tx.get(Rid::new(11, 9)).unwrap().version(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_state() {
        let conn = connection();
        let mut tx = transaction(&conn);
        tx.add(vertex("a")).unwrap();
        let before: Vec<_> = tx.records().cloned().collect();

        conn.fail(TransportError::ConnectionClosed);
        let err = tx.commit().await.unwrap_err();
        assert!(err.is_retryable());

        let after: Vec<_> = tx.records().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_commit_identity_leaves_state() {
        let conn = connection();
        let mut tx = transaction(&conn);
        tx.add(vertex("a")).unwrap();
        tx.add(vertex("b")).unwrap();
        let before: Vec<_> = tx.records().cloned().collect();

        let result = CommitResult {
            created: vec![
                (Rid::new(-1, -1), Rid::new(10, 100)),
                (Rid::new(-1, -7), Rid::new(10, 101)),
            ],
            updated: Vec::new(),
        };
        conn.respond(commit_response(&result));

        let err = tokio_test::block_on(tx.commit()).unwrap_err();
        assert!(matches!(err, ClientError::UnknownCommitIdentity(rid) if rid == Rid::new(-1, -7)));
        let after: Vec<_> = tx.records().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_commit_keeps_records_until_reset() {
        let conn = connection();
        let mut tx = transaction(&conn);
        tx.add(vertex("a")).unwrap();

        conn.respond(commit_response(&CommitResult {
            created: vec![(Rid::new(-1, -1), Rid::new(10, 0))],
            updated: vec![(Rid::new(10, 0), 1)],
        }));
        tokio_test::block_on(tx.commit()).unwrap();
        assert_eq!(tx.len(), 1);

        tx.reset();
        assert!(tx.is_empty());
        assert_eq!(tx.add(vertex("b")).unwrap(), Rid::new(-1, -1));
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Vertex {
        rid: Option<Rid>,
        version: i32,
        name: String,
    }

    impl Mapped for Vertex {
        fn class_name() -> &'static str {
            "V"
        }

        fn describe(mapper: &mut TypeMapper<Self>) {
            mapper
                .rid(|v| &v.rid, |v| &mut v.rid)
                .version(|v| &v.version, |v| &mut v.version)
                .field("name", |v| &v.name, |v| &mut v.name);
        }
    }

    #[tokio::test]
    async fn test_typed_staging() {
        let conn = connection();
        let mut tx = transaction(&conn);
        let temp = tx
            .add_object(&Vertex {
                name: "ada".to_string(),
                ..Vertex::default()
            })
            .unwrap();

        conn.respond(commit_response(&CommitResult {
            created: vec![(temp, Rid::new(10, 100))],
            updated: vec![(Rid::new(10, 100), 1)],
        }));
        tx.commit().await.unwrap();

        let stored: Vertex = tx.object(Rid::new(10, 100)).unwrap().unwrap();
        assert_eq!(
            stored,
            Vertex {
                rid: Some(Rid::new(10, 100)),
                version: 1,
                name: "ada".to_string(),
            }
        );

        let err = tx.update_object(&Vertex::default()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvariant(InvariantViolation::MissingIdentity { .. })
        ));
        tx.delete_object(&Vertex {
            rid: Some(Rid::new(10, 5)),
            ..Vertex::default()
        })
        .unwrap();
        assert_eq!(tx.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_temporary_positions_decrease(count in 1usize..64) {
            let conn = connection();
            let mut tx = transaction(&conn);
            for n in 1..=count {
                let rid = tx.add(vertex("v")).unwrap();
                prop_assert_eq!(rid, Rid::new(-1, -(n as i64)));
            }
            prop_assert_eq!(tx.len(), count);
        }
    }
}
