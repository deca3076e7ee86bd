//! The uniform response body.
//!
//! Every response, success or failure, is one of
//!
//! ```json
//! { "data": <value>, "status": 200 }
//! { "error": "<message>", "status": 404 }
//! ```
//!
//! with `status` equal to the HTTP status line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Data { data: Value, status: u16 },
    Error { error: String, status: u16 },
}

impl Envelope {
    pub fn data(status: StatusCode, data: impl Into<Value>) -> Self {
        Envelope::Data {
            data: data.into(),
            status: status.as_u16(),
        }
    }

    pub fn error(status: StatusCode, error: impl Into<String>) -> Self {
        Envelope::Error {
            error: error.into(),
            status: status.as_u16(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Envelope::Data { status, .. } | Envelope::Error { status, .. } => *status,
        }
    }
}

/// A successful handler result: status plus payload.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    data: Value,
}

impl Reply {
    pub fn new(status: StatusCode, data: impl Into<Value>) -> Self {
        Self {
            status,
            data: data.into(),
        }
    }

    pub fn ok(data: impl Into<Value>) -> Self {
        Self::new(StatusCode::OK, data)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        tracing::debug!(status = self.status.as_u16(), data = %self.data, "Responding");
        (self.status, Json(Envelope::data(self.status, self.data))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_envelope_shape() {
        let env = Envelope::data(StatusCode::CREATED, json!({"id": "1"}));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"data": {"id": "1"}, "status": 201})
        );
        assert_eq!(env.status(), 201);
    }

    #[test]
    fn error_envelope_shape() {
        let env = Envelope::error(StatusCode::NOT_FOUND, "missing");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"error": "missing", "status": 404})
        );
    }

    #[test]
    fn envelopes_parse_back() {
        let env: Envelope = serde_json::from_value(json!({"error": "x", "status": 500})).unwrap();
        assert_eq!(env, Envelope::error(StatusCode::INTERNAL_SERVER_ERROR, "x"));

        let env: Envelope = serde_json::from_value(json!({"data": "ok", "status": 200})).unwrap();
        assert_eq!(env, Envelope::data(StatusCode::OK, "ok"));
    }
}
