use crate::{Document, MappingError, StorageKey};

/// Shallow-merge `changes` onto `existing`.
///
/// Every field in `changes` overwrites or adds the same field in `existing`;
/// fields only present in `existing` are kept. Nested objects are replaced,
/// not merged. The key is validated before any field is touched.
pub fn merge(
    key: &StorageKey,
    mut existing: Document,
    changes: Document,
) -> Result<Document, MappingError> {
    key.ensure_present()?;

    for (field, value) in changes.into_map() {
        existing.insert(field, value);
    }

    Ok(existing)
}
