use uuid::Uuid;

/// Generate a fresh document identifier.
///
/// 122 random bits in the hyphenated UUID v4 form. Uniqueness is
/// probabilistic; nothing checks the store for an existing key.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_hyphenated_uuids() {
        let id = new_id();
        assert_eq!(id.len(), 36);
        let parsed = Uuid::parse_str(&id).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }
}
