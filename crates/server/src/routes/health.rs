use crate::envelope::Reply;

/// Health check endpoint (liveness)
/// Returns 200 `"ok"` without touching the store
pub async fn health_check() -> Reply {
    Reply::ok("ok")
}
