use async_trait::async_trait;
use serde_json::Value;

use crate::document::{DocumentId, StoredDocument};
use crate::error::StoreResult;
use crate::query::Query;

/// Migration definition contributed by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Persistence port for JSON documents grouped in named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the id assigned to it.
    async fn insert(&self, collection: &str, body: Value) -> StoreResult<DocumentId>;

    /// Fetch a single document by id.
    async fn get(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<StoredDocument>>;

    /// Fetch every document matching the query.
    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>>;

    /// Count documents matching the query.
    async fn count(&self, collection: &str, query: &Query) -> StoreResult<u64>;

    /// Replace the body of an existing document.
    /// Returns `false` when no document has that id.
    async fn replace(&self, collection: &str, id: &DocumentId, body: Value) -> StoreResult<bool>;

    /// Remove a document. Returns `false` when no document has that id.
    async fn delete(&self, collection: &str, id: &DocumentId) -> StoreResult<bool>;

    /// Apply `(module, migration)` pairs that have not run yet, in the order given.
    /// Returns the number of migrations applied.
    async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> StoreResult<usize>;
}
