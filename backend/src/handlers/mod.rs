use axum::Json;
use serde_json::{json, Value};

pub mod rooms;
pub mod users;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
