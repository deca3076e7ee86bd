//! CRUD handlers over `/{doc_type}` and `/{doc_type}/{id}`.
//!
//! Each handler runs the same short sequence and stops at the first error:
//! parse the route (and body, for writes), map it to a storage key or list
//! query, make one or two store calls, wrap the result in the envelope.

use crate::envelope::Reply;
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use docproxy::{apply_update, build_list_query, prepare_create, Document, Pagination, StorageKey};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Query parameters for listing
///
/// Kept as raw strings so garbage values fall back to defaults instead of
/// failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<String>,

    #[serde(default)]
    pub amount: Option<String>,
}

impl ListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_params(self.page.as_deref(), self.amount.as_deref())
    }
}

/// Request body parsed as a JSON object, with every failure rendered as an
/// error envelope.
pub struct JsonBody(pub Document);

impl FromRequest<Arc<ServerState>> for JsonBody {
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ServerError::PayloadTooLarge(state.config.max_body_size_mb)
            } else {
                ServerError::BadRequest(rejection.body_text())
            }
        })?;

        Ok(Self(Document::from_slice(&bytes)?))
    }
}

/// `GET /{doc_type}`: one page of documents of this type
pub async fn list_documents(
    State(state): State<Arc<ServerState>>,
    Path(doc_type): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ServerResult<Reply> {
    let pagination = params
        .map(|Query(p)| p.pagination())
        .unwrap_or_default();

    let query = build_list_query(&doc_type, pagination);
    let documents = state.store.query(&query).await?;

    tracing::debug!(
        doc_type = %doc_type,
        page = pagination.page,
        amount = pagination.page_size,
        returned = documents.len(),
        "Listed documents"
    );

    Ok(Reply::ok(Value::Array(
        documents.into_iter().map(Value::from).collect(),
    )))
}

/// `POST /{doc_type}`: insert a new document, never overwriting
pub async fn create_document(
    State(state): State<Arc<ServerState>>,
    Path(doc_type): Path<String>,
    JsonBody(body): JsonBody,
) -> ServerResult<Reply> {
    let (key, document) = prepare_create(&doc_type, body)?;
    tracing::debug!(key = %key, "Creating document");

    state.store.insert(&key, &document).await?;

    Ok(Reply::new(StatusCode::CREATED, document))
}

/// `GET /{doc_type}/{id}`
pub async fn get_document(
    State(state): State<Arc<ServerState>>,
    Path((doc_type, id)): Path<(String, String)>,
) -> ServerResult<Reply> {
    let key = StorageKey::new(&doc_type, &id);
    let document = fetch(&state, &key).await?;

    Ok(Reply::ok(document))
}

/// `PUT /{doc_type}/{id}`: merge the body onto the stored document
///
/// The write is an unconditional upsert; two concurrent updates to the same
/// key race and the last one wins.
pub async fn update_document(
    State(state): State<Arc<ServerState>>,
    Path((doc_type, id)): Path<(String, String)>,
    JsonBody(changes): JsonBody,
) -> ServerResult<Reply> {
    let key = StorageKey::new(&doc_type, &id);
    let existing = fetch(&state, &key).await?;

    let merged = apply_update(&key, existing, changes)?;
    state.store.upsert(&key, &merged).await?;

    Ok(Reply::new(StatusCode::ACCEPTED, merged))
}

/// `DELETE /{doc_type}/{id}`: responds with the document as it was
pub async fn delete_document(
    State(state): State<Arc<ServerState>>,
    Path((doc_type, id)): Path<(String, String)>,
) -> ServerResult<Reply> {
    let key = StorageKey::new(&doc_type, &id);
    let existing = fetch(&state, &key).await?;

    state.store.remove(&key).await?;
    tracing::debug!(key = %key, "Deleted document");

    Ok(Reply::new(StatusCode::ACCEPTED, existing))
}

async fn fetch(state: &ServerState, key: &StorageKey) -> ServerResult<Document> {
    state
        .store
        .get(key)
        .await?
        .ok_or_else(|| ServerError::NotFound(key.to_string()))
}
