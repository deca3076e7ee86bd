//! # docproxy store
//!
//! The storage capability behind the proxy. Handlers never talk to a
//! database directly; they hold an `Arc<dyn DocumentStore>` and call the
//! five primitives every backend provides:
//!
//! - **insert**: write only if the key is unoccupied (fails with
//!   [`StoreError::KeyExists`] otherwise)
//! - **get**: fetch a single key, `None` if absent
//! - **upsert**: unconditional overwrite, last writer wins
//! - **remove**: delete a single key ([`StoreError::NotFound`] if absent)
//! - **query**: a [`ListQuery`] window over one `doc_type`
//!
//! ## Backends
//!
//! - [`InMemoryStore`]: a `BTreeMap` behind a lock; the default and what the
//!   tests run against.
//! - `RedbStore`: persistent single-file storage with redb
//!   (feature `backend-redb`).
//! - `QueryServiceStore`: a Couchbase bucket reached through the query
//!   service REST API (feature `backend-couchbase`).
//!
//! Backends are picked at runtime through [`StoreConfig`]:
//!
//! ```
//! use store::StoreConfig;
//!
//! let store = StoreConfig::Memory.build().unwrap();
//! assert_eq!(store.name(), "memory");
//! ```

mod backend;
mod error;

pub use backend::{CouchbaseConfig, DocumentStore, InMemoryStore, StoreConfig};
pub use docproxy::{Consistency, Document, ListQuery, StorageKey};
pub use error::StoreError;

#[cfg(feature = "backend-redb")]
pub use backend::RedbStore;

#[cfg(feature = "backend-couchbase")]
pub use backend::QueryServiceStore;
