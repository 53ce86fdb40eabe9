//! # ordb-client
//!
//! Client engine for ordb.
//!
//! This crate provides:
//! - The [`Connection`] seam and one-shot operation execution
//! - A [`Transaction`] engine staging creates, updates and deletes
//! - A [`Database`] facade for commands, typed queries and transactions
//! - Driver configuration loaded from YAML and the environment
//!
//! # Example
//!
//! ```ignore
//! let db = Database::with_config(conn, DriverConfig::load()?);
//!
//! let people: Vec<Person> = db.query_as("select from Person").await?;
//!
//! let mut tx = db.transaction();
//! tx.add_object(&Person::named("ada"))?;
//! tx.commit().await?;
//! ```

pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod transaction;

pub use config::{CommandConfig, ConfigError, DriverConfig, TransactionConfig};
pub use connection::{execute_operation, Connection};
pub use database::Database;
pub use error::{ClientError, InvariantViolation, TransportError};
pub use transaction::{Transaction, TransactionRecord};
