//! Plain HTTP handlers outside the MCP transport

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::session::SessionRegistry;

/// Health check endpoint
pub async fn health(State(sessions): State<SessionRegistry>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": sessions.len(),
    }))
}
