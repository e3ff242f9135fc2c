//! Document database for the catalog: a storage port, its SQLite adapter and
//! the migration runner.

pub mod document;
pub mod error;
pub mod query;
pub mod records;
pub mod sqlite;
pub mod store;

pub use document::{Document, DocumentId, Record, StoredDocument};
pub use error::{StoreError, StoreResult};
pub use query::{Direction, Filter, Query, Sort};
pub use records::Records;
pub use sqlite::SqliteStore;
pub use store::{DocumentStore, Migration};
