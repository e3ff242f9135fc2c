//! SQLite-backed document store.
//!
//! Every collection shares one `documents` table; bodies are JSON text and
//! filters are evaluated with SQLite's JSON1 functions.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

use crate::document::{DocumentId, StoredDocument};
use crate::error::{StoreError, StoreResult};
use crate::query::{json_path, sql_literal, Direction, Filter, Query};
use crate::store::{DocumentStore, Migration};

pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    PRIMARY KEY (module, id)
);
"#;

/// Thread-safe SQLite document store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if path.as_os_str() == IN_MEMORY {
            return Self::open_in_memory();
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_millis(500))?;
        Self::from_connection(conn, path)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, PathBuf::from(IN_MEMORY))
    }

    fn from_connection(conn: Connection, path: PathBuf) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(target: "catalog-db", path = %path.display(), "document store ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard)
        })
        .await?
    }
}

/// Build the `WHERE`/`ORDER BY`/`LIMIT` tail for a query along with its bound parameters.
fn query_clauses(collection: &str, query: &Query) -> (String, Vec<String>) {
    let mut sql = format!(" WHERE collection = {}", sql_literal(collection));
    let mut params = Vec::new();

    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value } => {
                let path = sql_literal(&json_path(field));
                sql.push_str(&format!(" AND json_extract(body, {path}) = ?"));
                params.push(value.clone());
            }
            Filter::Contains { field, value } => {
                let path = sql_literal(&json_path(field));
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM json_each(documents.body, {path}) AS item \
                     WHERE item.value = ?)"
                ));
                params.push(value.clone());
            }
        }
    }

    sql.push_str(" ORDER BY ");
    for sort in &query.sort {
        let direction = match sort.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        let path = sql_literal(&json_path(&sort.field));
        sql.push_str(&format!("json_extract(body, {path}) {direction}, "));
    }
    sql.push_str("id ASC");

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    (sql, params)
}

fn decode_row(id: String, body: String) -> StoreResult<StoredDocument> {
    Ok(StoredDocument {
        id: id.parse()?,
        body: serde_json::from_str(&body)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, collection: &str, body: Value) -> StoreResult<DocumentId> {
        let collection = collection.to_string();
        let id = DocumentId::generate();
        let body = serde_json::to_string(&body)?;

        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO documents (collection, id, body, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?)",
                params![collection, id.to_string(), body, now, now],
            )?;
            tracing::debug!(target: "catalog-db", %collection, %id, "document inserted");
            Ok(id)
        })
        .await
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<StoredDocument>> {
        let collection = collection.to_string();
        let id = *id;

        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, body FROM documents WHERE collection = ? AND id = ?",
                    params![collection, id.to_string()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;

            row.map(|(id, body)| decode_row(id, body)).transpose()
        })
        .await
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let (clauses, bound) = query_clauses(collection, query);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT id, body FROM documents{clauses}"))?;
            let rows = stmt
                .query_map(params_from_iter(bound.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, body)| decode_row(id, body))
                .collect()
        })
        .await
    }

    async fn count(&self, collection: &str, query: &Query) -> StoreResult<u64> {
        let mut query = query.clone();
        query.sort.clear();
        query.limit = None;
        let (clauses, bound) = query_clauses(collection, &query);

        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM documents{clauses}"),
                params_from_iter(bound.iter()),
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn replace(&self, collection: &str, id: &DocumentId, body: Value) -> StoreResult<bool> {
        let collection = collection.to_string();
        let id = *id;
        let body = serde_json::to_string(&body)?;

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE documents SET body = ?, updated_at = ? WHERE collection = ? AND id = ?",
                params![body, Utc::now().to_rfc3339(), collection, id.to_string()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> StoreResult<bool> {
        let collection = collection.to_string();
        let id = *id;

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE collection = ? AND id = ?",
                params![collection, id.to_string()],
            )?;
            if changed > 0 {
                tracing::debug!(target: "catalog-db", %collection, %id, "document deleted");
            }
            Ok(changed > 0)
        })
        .await
    }

    async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> StoreResult<usize> {
        let migrations = migrations.to_vec();

        self.with_conn(move |conn| {
            let mut applied = 0;
            for (module, migration) in &migrations {
                let already: Option<i64> = conn
                    .query_row(
                        "SELECT 1 FROM schema_migrations WHERE module = ? AND id = ?",
                        params![module, migration.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if already.is_some() {
                    continue;
                }

                let run = || -> rusqlite::Result<()> {
                    let tx = conn.unchecked_transaction()?;
                    tx.execute_batch(migration.up)?;
                    tx.execute(
                        "INSERT INTO schema_migrations (module, id, applied_at) VALUES (?, ?, ?)",
                        params![module, migration.id, Utc::now().to_rfc3339()],
                    )?;
                    tx.commit()
                };
                run().map_err(|source| StoreError::Migration {
                    module: module.clone(),
                    id: migration.id.to_string(),
                    source,
                })?;

                tracing::info!(
                    target: "catalog-db",
                    module = %module,
                    migration = migration.id,
                    "migration applied"
                );
                applied += 1;
            }
            Ok(applied)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for (title, genres) in [
            ("Zeta", json!(["g1"])),
            ("Alpha", json!(["g1", "g2"])),
            ("Mid", json!([])),
        ] {
            store
                .insert("book", json!({ "title": title, "genre": genres }))
                .await
                .unwrap();
        }
        store
    }

    fn titles(docs: &[StoredDocument]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.body["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert("genre", json!({ "name": "Fantasy" })).await.unwrap();

        let doc = store.get("genre", &id).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.body["name"], "Fantasy");

        // collections are isolated
        assert!(store.get("author", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_sorts_by_field() {
        let store = seeded().await;
        let docs = store
            .find("book", &Query::new().sort_asc("title"))
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["Alpha", "Mid", "Zeta"]);

        let docs = store
            .find("book", &Query::new().sort_desc("title").limit(1))
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["Zeta"]);
    }

    #[tokio::test]
    async fn find_filters_on_equality_and_membership() {
        let store = seeded().await;

        let docs = store
            .find("book", &Query::new().filter(Filter::eq("title", "Mid")))
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["Mid"]);

        let docs = store
            .find(
                "book",
                &Query::new()
                    .filter(Filter::contains("genre", "g1"))
                    .sort_asc("title"),
            )
            .await
            .unwrap();
        assert_eq!(titles(&docs), vec!["Alpha", "Zeta"]);

        let count = store
            .count("book", &Query::new().filter(Filter::contains("genre", "g2")))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn replace_and_delete_report_missing_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert("genre", json!({ "name": "Horor" })).await.unwrap();

        assert!(store
            .replace("genre", &id, json!({ "name": "Horror" }))
            .await
            .unwrap());
        let doc = store.get("genre", &id).await.unwrap().unwrap();
        assert_eq!(doc.body["name"], "Horror");

        let missing = DocumentId::generate();
        assert!(!store.replace("genre", &missing, json!({})).await.unwrap());
        assert!(!store.delete("genre", &missing).await.unwrap());

        assert!(store.delete("genre", &id).await.unwrap());
        assert!(store.get("genre", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let migrations = vec![(
            "genres".to_string(),
            Migration {
                id: "001_name_index",
                up: "CREATE INDEX IF NOT EXISTS genre_name \
                     ON documents (json_extract(body, '$.name')) WHERE collection = 'genre';",
            },
        )];

        assert_eq!(store.apply_migrations(&migrations).await.unwrap(), 1);
        assert_eq!(store.apply_migrations(&migrations).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn field_filters_match_expression_indexes() {
        let store = seeded().await;
        let migrations = vec![(
            "books".to_string(),
            Migration {
                id: "001_title_index",
                up: r#"CREATE INDEX IF NOT EXISTS book_title
                        ON documents (json_extract(body, '$."title"'))
                        WHERE collection = 'book';"#,
            },
        )];
        store.apply_migrations(&migrations).await.unwrap();

        // INDEXED BY fails to prepare when the planner cannot use the index
        let (clauses, bound) =
            query_clauses("book", &Query::new().filter(Filter::eq("title", "Mid")));
        let ids = store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT id FROM documents INDEXED BY book_title{clauses}"
                ))?;
                let ids = stmt
                    .query_map(params_from_iter(bound.iter()), |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ids)
            })
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn broken_migration_names_its_origin() {
        let store = SqliteStore::open_in_memory().unwrap();
        let migrations = vec![(
            "books".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE NONSENSE;",
            },
        )];

        let err = store.apply_migrations(&migrations).await.unwrap_err();
        assert!(err.to_string().starts_with("migration books/001_broken failed"));
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert("genre", json!({ "name": "Poetry" })).await.unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.get("genre", &id).await.unwrap().is_some());

        let memory = SqliteStore::open(IN_MEMORY).unwrap();
        assert_eq!(memory.path(), Path::new(IN_MEMORY));
    }
}
