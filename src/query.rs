use crate::DOC_TYPE_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Scan consistency requested from the store for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Whatever the index has right now.
    NotBounded,
    /// Wait until every mutation acknowledged before the query is visible.
    #[default]
    RequestPlus,
}

impl Consistency {
    pub fn as_str(self) -> &'static str {
        match self {
            Consistency::NotBounded => "not_bounded",
            Consistency::RequestPlus => "request_plus",
        }
    }
}

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Zero for either value falls back to its default.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// Parse raw `page` / `amount` query-string values. Missing, non-numeric
    /// and non-positive values use the defaults.
    pub fn from_params(page: Option<&str>, amount: Option<&str>) -> Self {
        Self::new(parse_positive(page), parse_positive(amount))
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

fn parse_positive(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

/// A filtered, paginated listing of one document type.
///
/// There is no ordering clause: page stability depends on the store's
/// natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub doc_type: String,
    pub limit: u64,
    pub offset: u64,
    pub consistency: Consistency,
}

impl ListQuery {
    /// Render the query-language statement against `bucket`.
    pub fn statement(&self, bucket: &str) -> String {
        format!(
            "SELECT RAW `b` FROM {} AS `b` WHERE `b`.{} = {} LIMIT {} OFFSET {}",
            quote_identifier(bucket),
            DOC_TYPE_FIELD,
            Value::from(self.doc_type.as_str()),
            self.limit,
            self.offset
        )
    }
}

/// Build the listing query for `doc_type` at `pagination`.
pub fn build_list_query(doc_type: &str, pagination: Pagination) -> ListQuery {
    ListQuery {
        doc_type: doc_type.to_string(),
        limit: pagination.page_size,
        offset: pagination.offset(),
        consistency: Consistency::RequestPlus,
    }
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_missing() {
        let p = Pagination::from_params(None, None);
        assert_eq!(p, Pagination { page: 1, page_size: 25 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn defaults_apply_when_params_garbage() {
        let p = Pagination::from_params(Some("two"), Some("-5"));
        assert_eq!(p, Pagination::default());
        let p = Pagination::from_params(Some("0"), Some("0"));
        assert_eq!(p, Pagination::default());
    }

    #[test]
    fn offset_is_zero_based() {
        let p = Pagination::from_params(Some("2"), Some("10"));
        assert_eq!(p.offset(), 10);
        let p = Pagination::from_params(Some("5"), None);
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn offset_saturates() {
        let p = Pagination::new(u64::MAX, u64::MAX);
        assert_eq!(p.offset(), u64::MAX);
    }

    #[test]
    fn list_query_uses_request_plus() {
        let q = build_list_query("widget", Pagination::new(3, 10));
        assert_eq!(q.doc_type, "widget");
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset, 20);
        assert_eq!(q.consistency, Consistency::RequestPlus);
    }

    #[test]
    fn statement_renders_filter_and_window() {
        let q = build_list_query("widget", Pagination::new(2, 10));
        assert_eq!(
            q.statement("default"),
            "SELECT RAW `b` FROM `default` AS `b` WHERE `b`.doc_type = \"widget\" LIMIT 10 OFFSET 10"
        );
    }

    #[test]
    fn statement_escapes_literals_and_identifiers() {
        let q = build_list_query("wid\"get", Pagination::default());
        let stmt = q.statement("my`bucket");
        assert!(stmt.contains("FROM `my``bucket`"));
        assert!(stmt.contains(r#"= "wid\"get""#));
    }
}
