//! Typed access to a single collection.

use std::marker::PhantomData;

use crate::document::{Document, DocumentId, Record};
use crate::error::StoreResult;
use crate::query::Query;
use crate::store::DocumentStore;

/// View of a [`DocumentStore`] restricted to documents of type `T`.
pub struct Records<'a, T> {
    store: &'a dyn DocumentStore,
    _doc: PhantomData<fn() -> T>,
}

impl<'a, T: Document> Records<'a, T> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            _doc: PhantomData,
        }
    }

    pub async fn get(&self, id: &DocumentId) -> StoreResult<Option<Record<T>>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Record::decode)
            .transpose()
    }

    /// Fetch every id in `ids`, skipping the ones that no longer exist.
    pub async fn get_many(&self, ids: &[DocumentId]) -> StoreResult<Vec<Record<T>>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub async fn find(&self, query: &Query) -> StoreResult<Vec<Record<T>>> {
        self.store
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(Record::decode)
            .collect()
    }

    pub async fn find_one(&self, query: &Query) -> StoreResult<Option<Record<T>>> {
        let query = query.clone().limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    pub async fn count(&self, query: &Query) -> StoreResult<u64> {
        self.store.count(T::COLLECTION, query).await
    }

    pub async fn insert(&self, doc: T) -> StoreResult<Record<T>> {
        let body = serde_json::to_value(&doc)?;
        let id = self.store.insert(T::COLLECTION, body).await?;
        Ok(Record { id, doc })
    }

    /// Replace the document stored under `id`. `None` when it does not exist.
    pub async fn replace(&self, id: &DocumentId, doc: T) -> StoreResult<Option<Record<T>>> {
        let body = serde_json::to_value(&doc)?;
        let found = self.store.replace(T::COLLECTION, id, body).await?;
        Ok(found.then(|| Record { id: *id, doc }))
    }

    pub async fn delete(&self, id: &DocumentId) -> StoreResult<bool> {
        self.store.delete(T::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use crate::sqlite::SqliteStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shelf {
        label: String,
    }

    impl Document for Shelf {
        const COLLECTION: &'static str = "shelf";
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let shelves = Records::<Shelf>::new(&store);

        let created = shelves
            .insert(Shelf {
                label: "B".to_string(),
            })
            .await
            .unwrap();
        shelves
            .insert(Shelf {
                label: "A".to_string(),
            })
            .await
            .unwrap();

        let fetched = shelves.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let first = shelves
            .find_one(&Query::new().sort_asc("label"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.doc.label, "A");

        let by_label = shelves
            .find_one(&Query::new().filter(Filter::eq("label", "B")))
            .await
            .unwrap();
        assert_eq!(by_label.map(|r| r.id), Some(created.id));
    }

    #[tokio::test]
    async fn get_many_skips_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let shelves = Records::<Shelf>::new(&store);
        let kept = shelves
            .insert(Shelf {
                label: "kept".to_string(),
            })
            .await
            .unwrap();

        let found = shelves
            .get_many(&[kept.id, DocumentId::generate()])
            .await
            .unwrap();
        assert_eq!(found, vec![kept]);
    }

    #[tokio::test]
    async fn replace_missing_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let shelves = Records::<Shelf>::new(&store);
        let replaced = shelves
            .replace(
                &DocumentId::generate(),
                Shelf {
                    label: "x".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(replaced.is_none());
    }
}
