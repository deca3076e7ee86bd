//! Couchbase backend over the query service REST API.
//!
//! Every primitive is a single N1QL statement posted to
//! `{scheme}://{host}:{port}/query/service`, with the key and document
//! passed as named parameters. TLS (`https`, port 18093) is the default;
//! `insecure = true` switches to plain `http` on 8093.
//!
//! # Configuration Example
//! ```toml
//! [store]
//! backend = "couchbase"
//! host = "10.0.0.12"
//! bucket = "default"
//! username = "proxy"
//! password = "secret"
//! ```

use crate::{CouchbaseConfig, DocumentStore, StoreError};
use async_trait::async_trait;
use docproxy::{Consistency, Document, ListQuery, StorageKey};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Query service port over TLS.
const TLS_PORT: u16 = 18093;
/// Query service port over plain HTTP.
const PLAIN_PORT: u16 = 8093;

/// "Duplicate Key" from an INSERT whose key is occupied.
const DUPLICATE_KEY: u64 = 12009;
/// "Index already exists" from CREATE PRIMARY INDEX.
const INDEX_EXISTS: u64 = 4300;

/// A Couchbase bucket reached through the query service.
pub struct QueryServiceStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl QueryServiceStore {
    /// Build the HTTP client for `cfg`. No request is sent until the first
    /// operation (usually [`DocumentStore::provision`] at startup).
    pub fn connect(cfg: &CouchbaseConfig) -> Result<Self, StoreError> {
        if cfg.bucket.is_empty() {
            return Err(StoreError::Config("couchbase bucket must not be empty".into()));
        }
        if cfg.host.is_empty() {
            return Err(StoreError::Config("couchbase host must not be empty".into()));
        }

        let endpoint = endpoint(cfg);
        if cfg.insecure {
            tracing::warn!(endpoint = %endpoint, "Connecting to Couchbase insecurely");
        }

        let timeout = Duration::from_secs(cfg.timeout_secs);
        // Outlasts the server-side timeout sent in each request body.
        let client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(StoreError::backend)?;

        tracing::info!(endpoint = %endpoint, bucket = %cfg.bucket, "Using Couchbase bucket");

        Ok(Self {
            client,
            endpoint,
            bucket: cfg.bucket.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, body: Value) -> Result<(bool, QueryResponse), StoreError> {
        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("query service request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(StoreError::backend)?;
        match serde_json::from_str::<QueryResponse>(&text) {
            Ok(parsed) => Ok((status.is_success(), parsed)),
            Err(_) if !status.is_success() => Err(StoreError::Backend(format!(
                "HTTP error {status}: {text}"
            ))),
            Err(e) => Err(StoreError::decode(e)),
        }
    }

    async fn execute(
        &self,
        statement: String,
        params: Vec<(&'static str, Value)>,
        consistency: Option<Consistency>,
        key: Option<&StorageKey>,
    ) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(statement = %statement, "query service request");
        let body = request_body(&statement, params, consistency, self.timeout);
        let (http_ok, response) = self.send(body).await?;
        interpret(http_ok, response, key)
    }
}

#[async_trait]
impl DocumentStore for QueryServiceStore {
    async fn insert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        let doc = serde_json::to_value(doc).map_err(StoreError::encode)?;
        self.execute(
            insert_statement(&self.bucket, "INSERT"),
            vec![("key", Value::from(key.as_str())), ("doc", doc)],
            None,
            Some(key),
        )
        .await?;
        Ok(())
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Document>, StoreError> {
        let rows = self
            .execute(
                get_statement(&self.bucket),
                vec![("key", Value::from(key.as_str()))],
                None,
                Some(key),
            )
            .await?;

        rows.into_iter().next().map(into_document).transpose()
    }

    async fn upsert(&self, key: &StorageKey, doc: &Document) -> Result<(), StoreError> {
        let doc = serde_json::to_value(doc).map_err(StoreError::encode)?;
        self.execute(
            insert_statement(&self.bucket, "UPSERT"),
            vec![("key", Value::from(key.as_str())), ("doc", doc)],
            None,
            Some(key),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StoreError> {
        let rows = self
            .execute(
                remove_statement(&self.bucket),
                vec![("key", Value::from(key.as_str()))],
                None,
                Some(key),
            )
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn query(&self, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let rows = self
            .execute(
                query.statement(&self.bucket),
                Vec::new(),
                Some(query.consistency),
                None,
            )
            .await?;

        rows.into_iter().map(into_document).collect()
    }

    async fn provision(&self) -> Result<(), StoreError> {
        let statement = format!(
            "CREATE PRIMARY INDEX IF NOT EXISTS ON {} USING GSI",
            keyspace(&self.bucket)
        );
        tracing::debug!(statement = %statement, "provisioning primary index");

        let body = request_body(&statement, Vec::new(), None, self.timeout);
        let (http_ok, response) = self.send(body).await?;
        if response.errors.iter().any(|e| e.code == INDEX_EXISTS) {
            return Ok(());
        }
        interpret(http_ok, response, None)?;
        tracing::info!(bucket = %self.bucket, "Primary index ready");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "couchbase"
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    errors: Vec<QueryError>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    #[serde(default)]
    code: u64,
    #[serde(default)]
    msg: String,
}

fn endpoint(cfg: &CouchbaseConfig) -> String {
    let (scheme, default_port) = if cfg.insecure {
        ("http", PLAIN_PORT)
    } else {
        ("https", TLS_PORT)
    };
    format!(
        "{scheme}://{}:{}/query/service",
        cfg.host,
        cfg.port.unwrap_or(default_port)
    )
}

fn keyspace(bucket: &str) -> String {
    format!("`{}`", bucket.replace('`', "``"))
}

fn insert_statement(bucket: &str, verb: &str) -> String {
    format!("{verb} INTO {} (KEY, VALUE) VALUES ($key, $doc)", keyspace(bucket))
}

fn get_statement(bucket: &str) -> String {
    format!("SELECT RAW `b` FROM {} AS `b` USE KEYS $key", keyspace(bucket))
}

fn remove_statement(bucket: &str) -> String {
    format!("DELETE FROM {} USE KEYS $key RETURNING META().id", keyspace(bucket))
}

fn request_body(
    statement: &str,
    params: Vec<(&str, Value)>,
    consistency: Option<Consistency>,
    timeout: Duration,
) -> Value {
    let mut body = Map::new();
    body.insert("statement".into(), Value::from(statement));
    for (name, value) in params {
        body.insert(format!("${name}"), value);
    }
    if let Some(consistency) = consistency {
        body.insert("scan_consistency".into(), consistency.as_str().into());
    }
    body.insert("timeout".into(), format!("{}s", timeout.as_secs()).into());
    Value::Object(body)
}

fn interpret(
    http_ok: bool,
    response: QueryResponse,
    key: Option<&StorageKey>,
) -> Result<Vec<Value>, StoreError> {
    if let Some(key) = key {
        if response.errors.iter().any(|e| e.code == DUPLICATE_KEY) {
            return Err(StoreError::KeyExists(key.to_string()));
        }
    }

    let status_ok = matches!(response.status.as_str(), "" | "success");
    if http_ok && status_ok && response.errors.is_empty() {
        return Ok(response.results);
    }

    let detail = if response.errors.is_empty() {
        format!("status {:?}", response.status)
    } else {
        response
            .errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.msg))
            .collect::<Vec<_>>()
            .join("; ")
    };
    Err(StoreError::Backend(format!("query service error: {detail}")))
}

fn into_document(row: Value) -> Result<Document, StoreError> {
    Document::try_from(row).map_err(StoreError::decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docproxy::{build_list_query, Pagination};
    use serde_json::json;

    fn response(value: Value) -> QueryResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn endpoint_defaults_to_tls() {
        let cfg = CouchbaseConfig::default();
        assert_eq!(endpoint(&cfg), "https://127.0.0.1:18093/query/service");
    }

    #[test]
    fn insecure_uses_plain_http() {
        let cfg = CouchbaseConfig {
            host: "cb.local".into(),
            insecure: true,
            ..Default::default()
        };
        assert_eq!(endpoint(&cfg), "http://cb.local:8093/query/service");

        let cfg = CouchbaseConfig {
            port: Some(9000),
            ..cfg
        };
        assert_eq!(endpoint(&cfg), "http://cb.local:9000/query/service");
    }

    #[test]
    fn connect_rejects_empty_bucket() {
        let cfg = CouchbaseConfig {
            bucket: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            QueryServiceStore::connect(&cfg),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn statements_quote_the_keyspace() {
        assert_eq!(
            insert_statement("default", "INSERT"),
            "INSERT INTO `default` (KEY, VALUE) VALUES ($key, $doc)"
        );
        assert_eq!(
            get_statement("my`b"),
            "SELECT RAW `b` FROM `my``b` AS `b` USE KEYS $key"
        );
        assert_eq!(
            remove_statement("default"),
            "DELETE FROM `default` USE KEYS $key RETURNING META().id"
        );
    }

    #[test]
    fn list_body_carries_request_plus() {
        let query = build_list_query("widget", Pagination::new(2, 10));
        let body = request_body(
            &query.statement("default"),
            Vec::new(),
            Some(query.consistency),
            Duration::from_secs(75),
        );

        assert_eq!(body["scan_consistency"], "request_plus");
        assert_eq!(body["timeout"], "75s");
        assert!(body["statement"]
            .as_str()
            .unwrap()
            .ends_with("LIMIT 10 OFFSET 10"));
    }

    #[test]
    fn params_are_prefixed() {
        let body = request_body(
            "SELECT 1",
            vec![("key", json!("widget:1")), ("doc", json!({"a": 1}))],
            None,
            Duration::from_secs(5),
        );
        assert_eq!(body["$key"], "widget:1");
        assert_eq!(body["$doc"], json!({"a": 1}));
        assert!(body.get("scan_consistency").is_none());
    }

    #[test]
    fn duplicate_key_maps_to_key_exists() {
        let key = StorageKey::new("widget", "1");
        let resp = response(json!({
            "status": "errors",
            "errors": [{"code": 12009, "msg": "Duplicate Key: widget:1"}]
        }));
        assert_eq!(
            interpret(false, resp, Some(&key)).unwrap_err(),
            StoreError::KeyExists("widget:1".into())
        );
    }

    #[test]
    fn success_returns_rows() {
        let resp = response(json!({
            "status": "success",
            "results": [{"id": "1", "doc_type": "widget"}]
        }));
        let rows = interpret(true, resp, None).unwrap();
        assert_eq!(rows, vec![json!({"id": "1", "doc_type": "widget"})]);
    }

    #[test]
    fn errors_are_backend_failures() {
        let resp = response(json!({
            "status": "fatal",
            "errors": [{"code": 5000, "msg": "boom"}]
        }));
        assert_eq!(
            interpret(false, resp, None).unwrap_err(),
            StoreError::Backend("query service error: [5000] boom".into())
        );

        let resp = response(json!({"status": "timeout"}));
        assert!(matches!(
            interpret(true, resp, None),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn non_object_rows_fail_to_decode() {
        assert!(matches!(
            into_document(json!([1, 2])),
            Err(StoreError::Decode(_))
        ));
    }
}
