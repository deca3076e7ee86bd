use crate::StoreError;
use async_trait::async_trait;
use docproxy::{Document, ListQuery, StorageKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// The storage capability a handler is given at construction.
///
/// Implementations must be safe to share across concurrently running
/// requests; none of the methods take `&mut self`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `doc` at `key` only if nothing is stored there yet.
    async fn insert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError>;
    /// Fetch the document at `key`.
    async fn get(&self, key: &StorageKey) -> Result<Option<Document>, StoreError>;
    /// Write `doc` at `key`, replacing whatever is there.
    async fn upsert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError>;
    /// Delete the document at `key`.
    async fn remove(&self, key: &StorageKey) -> Result<(), StoreError>;
    /// Run a filtered, paginated listing.
    async fn query(&self, query: &ListQuery) -> Result<Vec<Document>, StoreError>;
    /// One-time setup needed before `query` works (index creation).
    async fn provision(&self) -> Result<(), StoreError> {
        Ok(())
    }
    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Connection settings for a Couchbase bucket reached through the query
/// service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CouchbaseConfig {
    #[serde(default = "default_couchbase_host")]
    pub host: String,

    /// Query service port; 18093 (TLS) or 8093 (insecure) when unset.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Talk plain HTTP instead of TLS.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Client-side request timeout in seconds.
    #[serde(default = "default_couchbase_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CouchbaseConfig {
    fn default() -> Self {
        Self {
            host: default_couchbase_host(),
            port: None,
            bucket: default_bucket(),
            insecure: false,
            username: String::new(),
            password: String::new(),
            timeout_secs: default_couchbase_timeout_secs(),
        }
    }
}

fn default_couchbase_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bucket() -> String {
    "default".to_string()
}

fn default_couchbase_timeout_secs() -> u64 {
    75
}

fn default_redb_path() -> String {
    "docproxy.redb".to_string()
}

/// Selects and builds a backend.
///
/// # Example
/// ```
/// use store::StoreConfig;
///
/// // In-memory (for testing)
/// let config = StoreConfig::Memory;
///
/// // Redb file on local disk
/// let config = StoreConfig::redb("/data/docproxy.redb");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local map; contents vanish on restart.
    #[default]
    Memory,
    /// Redb database file at `path`.
    Redb {
        #[serde(default = "default_redb_path")]
        path: String,
    },
    /// Couchbase bucket through the query service.
    Couchbase(CouchbaseConfig),
}

impl StoreConfig {
    pub fn redb<P: Into<String>>(path: P) -> Self {
        StoreConfig::Redb { path: path.into() }
    }

    /// Build the backend described by this configuration.
    ///
    /// Backends whose feature is disabled at compile time return
    /// [`StoreError::Config`].
    pub fn build(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match self {
            StoreConfig::Memory => Ok(Arc::new(InMemoryStore::new())),
            StoreConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(RedbStore::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::Config(
                        "redb backend disabled at compile time".into(),
                    ))
                }
            }
            StoreConfig::Couchbase(cfg) => {
                #[cfg(feature = "backend-couchbase")]
                {
                    Ok(Arc::new(QueryServiceStore::connect(cfg)?))
                }
                #[cfg(not(feature = "backend-couchbase"))]
                {
                    let _ = cfg;
                    Err(StoreError::Config(
                        "couchbase backend disabled at compile time".into(),
                    ))
                }
            }
        }
    }
}

/// An in-memory backend using a `RwLock` around a `BTreeMap`.
///
/// Iteration is in key order, so list pages are stable between calls.
pub struct InMemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.documents
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.documents
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        // Check and write under one write lock.
        let mut guard = self.write()?;
        if guard.contains_key(key.as_str()) {
            return Err(StoreError::KeyExists(key.to_string()));
        }
        guard.insert(key.to_string(), doc.clone());
        Ok(())
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Document>, StoreError> {
        Ok(self.read()?.get(key.as_str()).cloned())
    }

    async fn upsert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        self.write()?.insert(key.to_string(), doc.clone());
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StoreError> {
        match self.write()?.remove(key.as_str()) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn query(&self, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let guard = self.read()?;
        Ok(page_of(guard.values(), query))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Apply the `doc_type` filter and the offset/limit window to documents
/// already in natural order.
pub(crate) fn page_of<'a, I>(documents: I, query: &ListQuery) -> Vec<Document>
where
    I: Iterator<Item = &'a Document>,
{
    let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

    documents
        .filter(|doc| doc.doc_type() == Some(query.doc_type.as_str()))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

/// The Redb backend implementation.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbStore;

/// The Couchbase query-service backend implementation.
#[cfg(feature = "backend-couchbase")]
pub mod couchbase;

#[cfg(feature = "backend-couchbase")]
pub use self::couchbase::QueryServiceStore;
