use axum::{Json, Router, routing};
use serde_json::{Value, json};

use crate::core::app_state::AppState;

/// Public liveness check; does not touch the database.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", routing::get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": env!("CARGO_PKG_NAME") }))
}
