//! Session guard middleware
//!
//! Sits in front of the MCP transport and enforces the session rules:
//!
//! - `POST` without a session ID must be an `initialize` request; the ID
//!   minted by the transport is registered from the response header
//! - `POST` / `GET` / `DELETE` with a session ID must name a live session
//! - a successful `GET` opens the notification stream and starts a burst
//! - a successful `DELETE` removes the session

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{SessionRegistry, SESSION_ID_HEADER};
use crate::error::GatewayError;
use crate::logging::TraceContext;
use crate::notifier::Notifier;

/// Largest JSON-RPC body accepted on an initialize request
const MAX_INIT_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct SessionGuard {
    pub registry: SessionRegistry,
    pub notifier: Notifier,
}

/// Whether a JSON-RPC body is (or, for a batch, contains) an initialize request
pub fn is_initialize_request(body: &[u8]) -> bool {
    fn is_initialize(message: &Value) -> bool {
        message.get("jsonrpc").and_then(|v| v.as_str()) == Some("2.0")
            && message.get("method").and_then(|m| m.as_str()) == Some("initialize")
            && message.get("id").is_some()
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(batch)) => batch.iter().any(is_initialize),
        Ok(message) => is_initialize(&message),
        Err(_) => false,
    }
}

fn session_id_of<B>(request: &Request<B>) -> Option<String> {
    request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn rejected(trace_id: &str, reason: &str) -> Response {
    warn!(trace_id = %trace_id, reason, "[SessionGuard] Request rejected");
    GatewayError::SessionInvalid.into_response()
}

pub async fn session_guard_middleware(
    State(guard): State<SessionGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let trace_id = TraceContext::id_of(request.extensions());
    let session_id = session_id_of(&request);
    let method = request.method().clone();

    match (method, session_id) {
        (Method::POST, None) => {
            let (parts, body) = request.into_parts();
            let body_bytes = match to_bytes(body, MAX_INIT_BODY_BYTES).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(trace_id = %trace_id, "[SessionGuard] Failed to read body: {}", e);
                    return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
                }
            };

            if !is_initialize_request(&body_bytes) {
                return rejected(&trace_id, "missing session ID on non-initialize request");
            }

            let response = next
                .run(Request::from_parts(parts, Body::from(body_bytes)))
                .await;

            let minted = response
                .headers()
                .get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok());
            match minted {
                Some(id) => {
                    guard.registry.create(id);
                }
                None => warn!(
                    trace_id = %trace_id,
                    status = %response.status(),
                    "[SessionGuard] Initialize response carried no session ID"
                ),
            }
            response
        }
        (Method::POST, Some(id)) => {
            if !guard.registry.touch(&id) {
                return rejected(&trace_id, "unknown session ID");
            }
            next.run(request).await
        }
        (Method::GET, Some(id)) => {
            if !guard.registry.touch(&id) {
                return rejected(&trace_id, "unknown session ID");
            }
            let response = next.run(request).await;
            if response.status().is_success() {
                debug!(
                    trace_id = %trace_id,
                    session_id = %id,
                    "[SessionGuard] Notification stream opened"
                );
                guard.notifier.start_stream_burst(&id);
            }
            response
        }
        (Method::DELETE, Some(id)) => {
            if !guard.registry.contains(&id) {
                return rejected(&trace_id, "unknown session ID");
            }
            let response = next.run(request).await;
            if response.status().is_success() {
                guard.registry.remove(&id);
                info!(
                    trace_id = %trace_id,
                    session_id = %id,
                    "[SessionGuard] Session terminated by client"
                );
            }
            response
        }
        (Method::GET | Method::DELETE, None) => rejected(&trace_id, "missing session ID"),
        // Preflights and unsupported verbs are answered by the transport
        _ => next.run(request).await,
    }
}
