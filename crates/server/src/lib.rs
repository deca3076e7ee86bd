//! docproxy server - HTTP REST front end for a document store
//!
//! This crate exposes any [`store::DocumentStore`] as a small CRUD API.
//! Resource types are whatever the caller puts in the first path segment;
//! documents are arbitrary JSON objects.
//!
//! # Features
//!
//! - **Uniform envelope**: every response is `{data, status}` or `{error, status}`
//! - **Pluggable storage**: in-memory, redb or Couchbase, chosen by configuration
//! - **Configuration**: `.env`, `docproxy.{toml,yaml,json}` and `DOCPROXY__*` variables
//! - **Middleware**: request ID tracking, structured logging, timeouts, CORS
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /health` - Liveness probe, `"ok"`
//! - `GET /{doc_type}?page=&amount=` - List one page of documents (200)
//! - `POST /{doc_type}` - Create a document (201)
//! - `GET /{doc_type}/{id}` - Fetch a document (200, 404)
//! - `PUT /{doc_type}/{id}` - Merge fields into a document (202, 404)
//! - `DELETE /{doc_type}/{id}` - Delete a document, returning it (202, 404)

pub mod config;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use envelope::{Envelope, Reply};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
