//! High-level database API.

use crate::config::DriverConfig;
use crate::connection::{execute_operation, Connection};
use crate::error::ClientError;
use crate::transaction::Transaction;
use ordb_mapping::{to_object, Mapped};
use ordb_protocol::{
    CommandClass, CommandOperation, CommandPayload, CommandResult, JsonRecordSerializer,
    RecordSerializer,
};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Commands and transactions over one connection.
pub struct Database<C> {
    conn: C,
    serializer: Arc<dyn RecordSerializer>,
    config: DriverConfig,
    next_tx_id: AtomicI32,
}

impl<C: Connection> Database<C> {
    /// Creates a database handle with default configuration and JSON record
    /// bodies.
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, DriverConfig::default())
    }

    pub fn with_config(conn: C, config: DriverConfig) -> Self {
        Self {
            conn,
            serializer: Arc::new(JsonRecordSerializer),
            config,
            next_tx_id: AtomicI32::new(1),
        }
    }

    /// Replaces the record body format.
    pub fn with_serializer(mut self, serializer: Arc<dyn RecordSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Builds a command with the configured mode, fetch plan and limit.
    pub fn operation(&self, class: CommandClass, text: &str) -> CommandOperation {
        let defaults = &self.config.command;
        let mut payload = CommandPayload::new(text)
            .with_fetch_plan(defaults.fetch_plan.as_str())
            .with_limit(defaults.non_text_limit);
        if class == CommandClass::Script {
            payload = payload.with_language(defaults.script_language.as_str());
        }
        CommandOperation::new(defaults.mode, class, payload)
    }

    /// Executes a prepared command.
    pub async fn execute(&self, op: &CommandOperation) -> Result<CommandResult, ClientError> {
        execute_operation(&self.conn, op, self.serializer.as_ref()).await
    }

    /// Runs a read-only query.
    pub async fn query(&self, text: &str) -> Result<CommandResult, ClientError> {
        self.execute(&self.operation(CommandClass::Idempotent, text))
            .await
    }

    /// Runs a mutating command.
    pub async fn command(&self, text: &str) -> Result<CommandResult, ClientError> {
        self.execute(&self.operation(CommandClass::NonIdempotent, text))
            .await
    }

    /// Runs a script in the configured default language.
    pub async fn script(&self, text: &str) -> Result<CommandResult, ClientError> {
        self.execute(&self.operation(CommandClass::Script, text))
            .await
    }

    /// Runs a script in `language`.
    pub async fn script_in(&self, language: &str, text: &str) -> Result<CommandResult, ClientError> {
        let mut op = self.operation(CommandClass::Script, text);
        op.payload.language = Some(language.to_string());
        self.execute(&op).await
    }

    /// Runs a query and maps every returned document onto `T`.
    pub async fn query_as<T: Mapped>(&self, text: &str) -> Result<Vec<T>, ClientError> {
        let result = self.query(text).await?;
        let objects = result
            .documents()
            .into_iter()
            .map(to_object::<T>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(objects)
    }

    /// Starts a transaction with its own id and temporary identity counter.
    pub fn transaction(&self) -> Transaction<'_, C> {
        let tx_id = self.next_tx_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(tx_id, "transaction started");
        Transaction::new(
            &self.conn,
            self.serializer.clone(),
            &self.config.transaction,
            tx_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::ScriptedConnection;
    use bytes::Bytes;
    use ordb_mapping::TypeMapper;
    use ordb_protocol::codec::{WireReader, WireWriter};
    use ordb_protocol::command::SCRIPT_CLASS_NAME;
    use ordb_protocol::operation::write_ok_envelope;
    use ordb_protocol::record::{write_null, write_record};
    use ordb_protocol::{CommandContent, Document, OperationMode, Rid};

    #[derive(Debug, Default, PartialEq)]
    struct City {
        rid: Option<Rid>,
        name: String,
        zips: Option<Vec<i32>>,
    }

    impl Mapped for City {
        fn class_name() -> &'static str {
            "City"
        }

        fn describe(mapper: &mut TypeMapper<Self>) {
            mapper
                .rid(|c| &c.rid, |c| &mut c.rid)
                .field("name", |c| &c.name, |c| &mut c.name)
                .collection("zips", |c| &c.zips, |c| &mut c.zips);
        }
    }

    fn city(rid: Rid, name: &str) -> Document {
        Document::with_class("City")
            .with_rid(rid)
            .with_version(1)
            .with_field("name", name)
            .with_field("zips", 1000i32)
    }

    fn collection_response(docs: &[Document]) -> Bytes {
        let mut w = WireWriter::new();
        write_ok_envelope(&mut w, 3);
        w.put_u8(b'l').put_i32(docs.len() as i32 + 1);
        for doc in docs {
            write_record(&mut w, doc, &JsonRecordSerializer).unwrap();
        }
        write_null(&mut w);
        w.freeze()
    }

    /// Reads mode, class name and the string following the class name.
    fn command_head(request: &Bytes) -> (u8, String, String) {
        let mut r = WireReader::new(request);
        r.read_u8().unwrap();
        r.read_i32().unwrap();
        let mode = r.read_u8().unwrap();
        r.read_i32().unwrap();
        let class_name = r.read_string().unwrap();
        let next = r.read_string().unwrap();
        (mode, class_name, next)
    }

    #[tokio::test]
    async fn test_query_as_maps_documents() {
        let db = Database::new(ScriptedConnection::new(3));
        db.connection().respond(collection_response(&[
            city(Rid::new(12, 0), "Rome"),
            city(Rid::new(12, 1), "Oslo"),
        ]));

        let cities: Vec<City> = db.query_as("select from City").await.unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(
            cities[1],
            City {
                rid: Some(Rid::new(12, 1)),
                name: "Oslo".to_string(),
                zips: Some(vec![1000]),
            }
        );
    }

    #[tokio::test]
    async fn test_config_defaults_reach_request() {
        let mut config = DriverConfig::default();
        config.command.fetch_plan = "*:1".to_string();
        config.command.non_text_limit = 50;
        let db = Database::with_config(ScriptedConnection::new(3), config);

        let mut w = WireWriter::new();
        write_ok_envelope(&mut w, 3);
        w.put_u8(b'n');
        db.connection().respond(w.freeze());

        let result = db.command("delete from City").await.unwrap();
        assert_eq!(result.content, CommandContent::None);

        let requests = db.connection().requests();
        let mut r = WireReader::new(&requests[0]);
        assert_eq!(r.read_u8().unwrap(), 41);
        assert_eq!(r.read_i32().unwrap(), 3);
        assert_eq!(r.read_u8().unwrap(), b's');
        r.read_i32().unwrap();
        r.read_string().unwrap();
        assert_eq!(r.read_string().unwrap(), "delete from City");
        assert_eq!(r.read_i32().unwrap(), 50);
        assert_eq!(r.read_string().unwrap(), "*:1");
        assert_eq!(r.read_i32().unwrap(), 0);
        assert!(r.is_exhausted());
    }

    #[tokio::test]
    async fn test_script_language() {
        let db = Database::new(ScriptedConnection::new(3));
        for _ in 0..2 {
            let mut w = WireWriter::new();
            write_ok_envelope(&mut w, 3);
            w.put_u8(b'a').put_i32(2).put_raw(b"ok");
            db.connection().respond(w.freeze());
        }

        let result = db.script("begin; commit;").await.unwrap();
        assert_eq!(result.serialized(), Some("ok"));
        db.script_in("javascript", "1 + 1").await.unwrap();

        let requests = db.connection().requests();
        let (_, class_name, language) = command_head(&requests[0]);
        assert_eq!(class_name, SCRIPT_CLASS_NAME);
        assert_eq!(language, "sql");
        let (_, _, language) = command_head(&requests[1]);
        assert_eq!(language, "javascript");
    }

    #[tokio::test]
    async fn test_async_mode_from_config() {
        let mut config = DriverConfig::default();
        config.command.mode = OperationMode::Asynchronous;
        let db = Database::with_config(ScriptedConnection::new(3), config);

        let mut w = WireWriter::new();
        write_ok_envelope(&mut w, 3);
        w.put_u8(1);
        write_record(&mut w, &city(Rid::new(12, 0), "Rome"), &JsonRecordSerializer).unwrap();
        w.put_u8(0);
        db.connection().respond(w.freeze());

        let result = db.query("select from City").await.unwrap();
        assert_eq!(result.documents().len(), 1);

        let (mode, _, text) = command_head(&db.connection().requests()[0]);
        assert_eq!(mode, b'a');
        assert_eq!(text, "select from City");
    }

    #[test]
    fn test_transaction_ids_increase() {
        let db = Database::new(ScriptedConnection::new(3));
        let first = db.transaction().tx_id();
        let second = db.transaction().tx_id();
        assert_eq!(second, first + 1);
    }
}
