//! HTTP Request/Response Logging Middleware
//!
//! One entry line and one exit line per request, correlated by trace ID.
//! MCP POST bodies are small JSON-RPC envelopes, so both sides are buffered
//! and summarized; GET streams are long-lived SSE and are passed through.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::logging::TraceContext;
use crate::session::SESSION_ID_HEADER;

/// Maximum body size to log (1MB)
const MAX_BODY_LOG_SIZE: usize = 1024 * 1024;

/// Headers that should be redacted
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-token"];

fn redact_headers_compact(headers: &axum::http::HeaderMap) -> String {
    headers
        .iter()
        .filter(|(name, _)| {
            matches!(
                name.as_str(),
                "content-type"
                    | "accept"
                    | "user-agent"
                    | "authorization"
                    | "mcp-session-id"
                    | "mcp-protocol-version"
            )
        })
        .map(|(name, value)| {
            if SENSITIVE_HEADERS.contains(&name.as_str()) {
                format!("{}=[REDACTED]", name)
            } else {
                format!("{}={:?}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compact one-line rendering of a body
pub fn format_body(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "[empty]".to_string();
    }

    if bytes.len() > MAX_BODY_LOG_SIZE {
        return format!("[{} bytes]", bytes.len());
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => {
            if let Ok(json) = serde_json::from_str::<Value>(text) {
                if let Some(method) = json.get("method").and_then(|m| m.as_str()) {
                    return method.to_string();
                }
                return serde_json::to_string(&json).unwrap_or_else(|_| text.to_string());
            }
            if text.chars().count() > 200 {
                format!("{}...", text.chars().take(200).collect::<String>())
            } else {
                text.to_string()
            }
        }
        Err(_) => format!("[binary: {} bytes]", bytes.len()),
    }
}

/// JSON-RPC messages carried by a response body
///
/// Handles both plain `application/json` bodies and `text/event-stream`
/// bodies, where each message sits on a `data:` line.
pub fn jsonrpc_messages(bytes: &[u8]) -> Vec<Value> {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return Vec::new();
    };

    if let Ok(json) = serde_json::from_str::<Value>(text) {
        return match json {
            Value::Array(items) => items,
            other => vec![other],
        };
    }

    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str::<Value>(data.trim()).ok())
        .collect()
}

/// Summarize an MCP response body for the debug log
fn format_mcp_response(bytes: &[u8]) -> Option<String> {
    let summaries: Vec<String> = jsonrpc_messages(bytes)
        .iter()
        .filter_map(summarize_message)
        .collect();

    if summaries.is_empty() {
        None
    } else {
        Some(summaries.join("; "))
    }
}

fn summarize_message(json: &Value) -> Option<String> {
    if let Some(error) = json.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown");
        return Some(format!("error: {} ({})", message, code));
    }

    let result = json.get("result")?;

    if let Some(tools) = result.get("tools").and_then(|t| t.as_array()) {
        return Some(format!("tools: {}", tools.len()));
    }
    if let Some(content) = result.get("content").and_then(|c| c.as_array()) {
        let failed = result
            .get("isError")
            .and_then(|e| e.as_bool())
            .unwrap_or(false);
        return Some(format!(
            "content: {} items{}",
            content.len(),
            if failed { " (isError)" } else { "" }
        ));
    }
    if let Some(version) = result.get("protocolVersion").and_then(|v| v.as_str()) {
        let name = result
            .get("serverInfo")
            .and_then(|s| s.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("?");
        return Some(format!("initialized: {} ({})", name, version));
    }

    match result.as_object() {
        Some(map) if !map.is_empty() => {
            let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
            Some(format!("result: {{{}}}", keys.join(", ")))
        }
        _ => Some("ok".to_string()),
    }
}

/// JSON-RPC method of a request body (first message of a batch)
pub fn extract_mcp_method(bytes: &[u8]) -> Option<String> {
    let json: Value = serde_json::from_slice(bytes).ok()?;
    let message = match &json {
        Value::Array(items) => items.first()?,
        other => other,
    };
    message
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from)
}

/// Logging middleware for requests and responses
///
/// Generates a trace_id, stores the `TraceContext` in request extensions and
/// logs a single entry/exit line per request.
pub async fn http_logging_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let session_id = request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let ctx = TraceContext::new(method.as_str(), &path).with_session(session_id);
    let span = ctx.span();

    async move {
        debug!(
            trace_id = %ctx.trace_id,
            headers = %redact_headers_compact(request.headers()),
            "Request headers"
        );

        // Long-lived SSE streams and CORS preflights pass straight through
        if method != Method::POST {
            ctx.log_request();
            let mut request = request;
            request.extensions_mut().insert(ctx.clone());
            let response = next.run(request).await;
            ctx.log_response(response.status().as_u16());
            return Ok(response);
        }

        let (parts, body) = request.into_parts();
        let body_bytes = match to_bytes(body, MAX_BODY_LOG_SIZE).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, "Failed to read request body: {}", e);
                return Err(StatusCode::PAYLOAD_TOO_LARGE);
            }
        };

        let ctx = ctx.with_mcp_method(extract_mcp_method(&body_bytes));
        ctx.log_request();
        if !ctx.is_mcp() && !body_bytes.is_empty() {
            debug!(trace_id = %ctx.trace_id, body = %format_body(&body_bytes), "Request body");
        }

        let mut request = Request::from_parts(parts, Body::from(body_bytes));
        request.extensions_mut().insert(ctx.clone());

        let response = next.run(request).await;
        let (parts, body) = response.into_parts();
        let status = parts.status;

        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, "Failed to read response body: {}", e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let summary = if ctx.is_mcp() {
            format_mcp_response(&body_bytes)
        } else {
            None
        };
        if let Some(summary) = &summary {
            debug!(trace_id = %ctx.trace_id, response = %summary, "MCP response");
        } else if !body_bytes.is_empty() && body_bytes.len() < 1000 {
            debug!(trace_id = %ctx.trace_id, body = %format_body(&body_bytes), "Response body");
        }

        ctx.log_response(status.as_u16());

        Ok(Response::from_parts(parts, Body::from(body_bytes)))
    }
    .instrument(span)
    .await
}
