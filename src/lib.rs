//! docproxy mapping layer.
//!
//! This crate turns REST resource coordinates into document-store
//! operations. It owns everything between "the router handed us a
//! `doc_type`, an optional `id` and a JSON body" and "the store client is
//! called", and nothing else: no I/O, no clock, no global state.
//!
//! ## What lives here
//!
//! - [`Document`]: an insertion-ordered JSON object with the three reserved
//!   fields `id`, `doc_type` and `key`
//! - [`StorageKey`]: the deterministic `"<doc_type>:<id>"` key
//! - [`new_id`]: random UUID v4 identifiers for documents created without one
//! - [`merge`]: shallow field merge used by updates
//! - [`build_list_query`]: filtered, paginated listing by `doc_type`
//!
//! ## Invariants worth knowing
//!
//! - The same `(doc_type, id)` pair always produces the same key
//! - A key with an empty identifier is blank, and blank keys are never written
//! - Merges are shallow; nested objects are replaced wholesale
//! - List queries always ask for request-plus consistency
//!
//! ```
//! use docproxy::{prepare_create, Document, StorageKey};
//!
//! let body = Document::from_slice(br#"{"color":"red"}"#).unwrap();
//! let (key, doc) = prepare_create("widget", body).unwrap();
//!
//! assert_eq!(key, StorageKey::new("widget", doc.id().unwrap()));
//! assert_eq!(doc.doc_type(), Some("widget"));
//! assert_eq!(doc.key(), Some(key.as_str()));
//! ```

mod document;
mod error;
mod id;
mod key;
mod merge;
mod query;

pub use crate::document::{Document, DOC_TYPE_FIELD, ID_FIELD, KEY_FIELD};
pub use crate::error::MappingError;
pub use crate::id::new_id;
pub use crate::key::{build_key, StorageKey, KEY_DELIMITER};
pub use crate::merge::merge;
pub use crate::query::{
    build_list_query, Consistency, ListQuery, Pagination, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};

use serde_json::Value;

/// Prepare a freshly posted body for insertion.
///
/// Uses the caller's `id` field when it is a string, generates one when the
/// field is absent or `null`, and stamps all three reserved fields. The
/// returned key is guaranteed non-blank.
pub fn prepare_create(
    doc_type: &str,
    mut body: Document,
) -> Result<(StorageKey, Document), MappingError> {
    let id = match body.get(ID_FIELD) {
        None | Some(Value::Null) => new_id(),
        Some(Value::String(id)) => id.clone(),
        Some(_) => return Err(MappingError::InvalidId),
    };

    let key = StorageKey::new(doc_type, &id);
    key.ensure_present()?;
    body.stamp(&key);

    Ok((key, body))
}

/// Apply a partial update to the stored document at `key`.
///
/// The reserved fields in `changes` are forced to their canonical values
/// before the merge, so a caller can never move a document to another key
/// or type through its body.
pub fn apply_update(
    key: &StorageKey,
    existing: Document,
    mut changes: Document,
) -> Result<Document, MappingError> {
    key.ensure_present()?;
    changes.stamp(key);
    merge(key, existing, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::try_from(value).expect("object literal")
    }

    #[test]
    fn create_generates_id_when_absent() {
        let (key, stored) = prepare_create("widget", doc(json!({"color": "red"}))).unwrap();

        let id = stored.id().expect("id stamped");
        assert!(!id.is_empty());
        assert_eq!(key.as_str(), format!("widget:{id}"));
        assert_eq!(stored.doc_type(), Some("widget"));
        assert_eq!(stored.key(), Some(key.as_str()));
        assert_eq!(stored.get("color"), Some(&json!("red")));
    }

    #[test]
    fn create_keeps_caller_id() {
        let (key, stored) =
            prepare_create("widget", doc(json!({"id": "w-1", "color": "red"}))).unwrap();
        assert_eq!(key.as_str(), "widget:w-1");
        assert_eq!(stored.id(), Some("w-1"));
    }

    #[test]
    fn create_treats_null_id_as_absent() {
        let (key, stored) = prepare_create("widget", doc(json!({"id": null}))).unwrap();
        assert!(!key.is_blank());
        assert_ne!(stored.id(), Some(""));
    }

    #[test]
    fn create_rejects_blank_caller_id() {
        let err = prepare_create("widget", doc(json!({"id": ""}))).unwrap_err();
        assert_eq!(err, MappingError::BlankId);
    }

    #[test]
    fn create_rejects_non_string_id() {
        let err = prepare_create("widget", doc(json!({"id": 42}))).unwrap_err();
        assert_eq!(err, MappingError::InvalidId);
    }

    #[test]
    fn create_overrides_reserved_fields_from_body() {
        let body = doc(json!({"id": "w-2", "doc_type": "gadget", "key": "gadget:zzz"}));
        let (_, stored) = prepare_create("widget", body).unwrap();
        assert_eq!(stored.doc_type(), Some("widget"));
        assert_eq!(stored.key(), Some("widget:w-2"));
    }

    #[test]
    fn update_forces_canonical_reserved_fields() {
        let key = StorageKey::new("widget", "w-1");
        let existing = doc(json!({
            "id": "w-1", "doc_type": "widget", "key": "widget:w-1", "color": "red", "size": 3
        }));
        let changes = doc(json!({"color": "blue", "id": "other", "doc_type": "gadget"}));

        let merged = apply_update(&key, existing, changes).unwrap();
        assert_eq!(merged.id(), Some("w-1"));
        assert_eq!(merged.doc_type(), Some("widget"));
        assert_eq!(merged.key(), Some("widget:w-1"));
        assert_eq!(merged.get("color"), Some(&json!("blue")));
        assert_eq!(merged.get("size"), Some(&json!(3)));
    }

    #[test]
    fn update_rejects_blank_key() {
        let key = StorageKey::new("widget", "");
        let err = apply_update(&key, Document::new(), Document::new()).unwrap_err();
        assert_eq!(err, MappingError::BlankId);
    }
}
