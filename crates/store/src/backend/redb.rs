//! Redb backend for docproxy document storage.
//!
//! Documents are stored as JSON bytes in a single table keyed by the
//! storage key. Every operation is one redb transaction run on tokio's
//! blocking pool, so a committed write is durable and visible to every
//! later read: list queries get request-plus consistency for free.
//!
//! # Configuration Example
//! ```toml
//! [store]
//! backend = "redb"
//! path = "/data/docproxy.redb"
//! ```

use crate::{DocumentStore, StoreError};
use async_trait::async_trait;
use docproxy::{Document, ListQuery, StorageKey};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table definition for stored documents
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Redb backend implementation for persistent document storage.
///
/// The `Arc<Database>` is cloned into each blocking task; redb handles its
/// own locking and MVCC.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// ```no_run
    /// use store::RedbStore;
    ///
    /// let store = RedbStore::open("/tmp/docproxy.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(StoreError::backend)?;

        // Accessing the table in a write transaction creates it.
        let write_txn = db.begin_write().map_err(StoreError::backend)?;
        {
            let _table = write_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;

        Ok(Self { db: Arc::new(db) })
    }

    async fn run<F, T>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(StoreError::backend)?
    }

    async fn write(
        &self,
        key: &StorageKey,
        doc: &Document,
        fail_if_exists: bool,
    ) -> Result<(), StoreError> {
        let key = key.to_string();
        let bytes = serde_json::to_vec(doc).map_err(StoreError::encode)?;

        self.run(move |db| {
            let write_txn = db.begin_write().map_err(StoreError::backend)?;
            {
                let mut table = write_txn
                    .open_table(DOCUMENTS)
                    .map_err(StoreError::backend)?;
                if fail_if_exists {
                    let occupied = table
                        .get(key.as_str())
                        .map_err(StoreError::backend)?
                        .is_some();
                    if occupied {
                        // Dropping the uncommitted transaction aborts it.
                        return Err(StoreError::KeyExists(key));
                    }
                }
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(StoreError::backend)?;
            }
            write_txn.commit().map_err(StoreError::backend)?;
            tracing::debug!(key = %key, "redb write committed");
            Ok(())
        })
        .await
    }
}

fn decode(bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(StoreError::decode)
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn insert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        self.write(key, doc, true).await
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Document>, StoreError> {
        let key = key.to_string();
        self.run(move |db| {
            let read_txn = db.begin_read().map_err(StoreError::backend)?;
            let table = read_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;

            match table.get(key.as_str()).map_err(StoreError::backend)? {
                Some(value) => Ok(Some(decode(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn upsert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        self.write(key, doc, false).await
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StoreError> {
        let key = key.to_string();
        self.run(move |db| {
            let write_txn = db.begin_write().map_err(StoreError::backend)?;
            {
                let mut table = write_txn
                    .open_table(DOCUMENTS)
                    .map_err(StoreError::backend)?;
                let removed = table
                    .remove(key.as_str())
                    .map_err(StoreError::backend)?
                    .is_some();
                if !removed {
                    return Err(StoreError::NotFound(key));
                }
            }
            write_txn.commit().map_err(StoreError::backend)?;
            Ok(())
        })
        .await
    }

    async fn query(&self, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let query = query.clone();
        self.run(move |db| {
            let read_txn = db.begin_read().map_err(StoreError::backend)?;
            let table = read_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;

            let mut skipped = 0u64;
            let mut page = Vec::new();
            for item in table.iter().map_err(StoreError::backend)? {
                if page.len() as u64 >= query.limit {
                    break;
                }
                let (_, value) = item.map_err(StoreError::backend)?;
                let doc = decode(value.value())?;
                if doc.doc_type() != Some(query.doc_type.as_str()) {
                    continue;
                }
                if skipped < query.offset {
                    skipped += 1;
                    continue;
                }
                page.push(doc);
            }
            Ok(page)
        })
        .await
    }

    fn name(&self) -> &'static str {
        "redb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docproxy::{build_list_query, prepare_create, Pagination};
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn widget(n: u64) -> (StorageKey, Document) {
        let body = Document::try_from(json!({"id": format!("w-{n:02}"), "n": n})).unwrap();
        prepare_create("widget", body).unwrap()
    }

    #[tokio::test]
    async fn test_redb_store_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();
        let (key, doc) = widget(1);

        store.insert(&key, &doc).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(doc));
        assert_eq!(
            store.get(&StorageKey::new("widget", "nope")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_redb_store_insert_conflict() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();
        let (key, doc) = widget(1);
        store.insert(&key, &doc).await.unwrap();

        let mut other = doc.clone();
        other.insert("n", 7);
        assert!(matches!(
            store.insert(&key, &other).await,
            Err(StoreError::KeyExists(_))
        ));
        assert_eq!(store.get(&key).await.unwrap(), Some(doc));

        store.upsert(&key, &other).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn test_redb_store_remove() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();
        let (key, doc) = widget(1);

        assert!(matches!(
            store.remove(&key).await,
            Err(StoreError::NotFound(_))
        ));
        store.insert(&key, &doc).await.unwrap();
        store.remove(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_redb_store_query_pages() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();
        for n in 0..25 {
            let (key, doc) = widget(n);
            store.insert(&key, &doc).await.unwrap();
        }

        let page1 = store
            .query(&build_list_query("widget", Pagination::new(1, 10)))
            .await
            .unwrap();
        let page2 = store
            .query(&build_list_query("widget", Pagination::new(2, 10)))
            .await
            .unwrap();
        assert_eq!(page1.len(), 10);
        assert_eq!(page2.len(), 10);
        assert_eq!(page2[0].id(), Some("w-10"));
        assert!(page1.iter().all(|d| !page2.contains(d)));
    }

    #[tokio::test]
    async fn test_redb_store_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let (key, doc) = widget(3);
        {
            let store = RedbStore::open(temp_file.path()).unwrap();
            store.insert(&key, &doc).await.unwrap();
        }
        let store = RedbStore::open(temp_file.path()).unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(doc));
    }
}
