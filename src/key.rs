use crate::MappingError;
use std::fmt;

/// Separator between the type and identifier halves of a key.
pub const KEY_DELIMITER: char = ':';

/// Storage key `"<doc_type>:<id>"` addressing one document in the flat
/// keyspace of the store.
///
/// Neither half is escaped: a `doc_type` or `id` containing the delimiter
/// can collide with another pair (`"a:b" + "c"` and `"a" + "b:c"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    full: String,
    split: usize,
}

impl StorageKey {
    pub fn new(doc_type: &str, id: &str) -> Self {
        let mut full = String::with_capacity(doc_type.len() + 1 + id.len());
        full.push_str(doc_type);
        full.push(KEY_DELIMITER);
        full.push_str(id);
        Self {
            full,
            split: doc_type.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn doc_type(&self) -> &str {
        &self.full[..self.split]
    }

    pub fn id(&self) -> &str {
        &self.full[self.split + KEY_DELIMITER.len_utf8()..]
    }

    /// A key is blank when it has no identifier to address.
    pub fn is_blank(&self) -> bool {
        self.id().is_empty() || self.doc_type().is_empty()
    }

    pub fn ensure_present(&self) -> Result<(), MappingError> {
        if self.is_blank() {
            return Err(MappingError::BlankId);
        }
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.full
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

/// Free-function form of [`StorageKey::new`].
pub fn build_key(doc_type: &str, id: &str) -> StorageKey {
    StorageKey::new(doc_type, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_type_and_id() {
        let key = build_key("widget", "abc-123");
        assert_eq!(key.as_str(), "widget:abc-123");
        assert_eq!(key.doc_type(), "widget");
        assert_eq!(key.id(), "abc-123");
        assert_eq!(key.to_string(), "widget:abc-123");
    }

    #[test]
    fn key_is_deterministic() {
        assert_eq!(build_key("widget", "1"), build_key("widget", "1"));
        assert_ne!(build_key("widget", "1"), build_key("widget", "2"));
        assert_ne!(build_key("widget", "1"), build_key("gadget", "1"));
    }

    #[test]
    fn empty_id_is_well_formed_but_blank() {
        let key = build_key("widget", "");
        assert_eq!(key.as_str(), "widget:");
        assert!(key.is_blank());
        assert_eq!(key.ensure_present(), Err(MappingError::BlankId));
    }

    #[test]
    fn halves_survive_delimiters_inside_doc_type() {
        let key = build_key("a:b", "c");
        assert_eq!(key.doc_type(), "a:b");
        assert_eq!(key.id(), "c");
        // Same text as ("a", "b:c"); only the split differs.
        assert_eq!(key.as_str(), build_key("a", "b:c").as_str());
    }
}
