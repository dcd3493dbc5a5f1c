use axum::Json;
use serde_json::{json, Value};

/// Handle /health endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
