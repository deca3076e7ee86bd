//! API route handlers
//!
//! - `health`: liveness probe
//! - `documents`: CRUD over `/{doc_type}` and `/{doc_type}/{id}`

pub mod documents;
pub mod health;

use crate::error::ServerError;
use axum::http::Uri;

/// 404 Not Found handler
///
/// Returns a standardized error envelope for undefined routes.
pub async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(format!("no route for {}", uri.path()))
}

/// 405 handler for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
