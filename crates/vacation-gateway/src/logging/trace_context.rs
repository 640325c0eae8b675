//! Per-request correlation
//!
//! Each inbound request is tagged with a short trace ID. The HTTP logging
//! middleware stores the [`TraceContext`] in the request extensions, and the
//! auth and session layers read the ID back so their log lines line up.

use std::time::Instant;
use tracing::{info, info_span, Span};
use vacation_core::branding::MCP_ENDPOINT;

/// Length of the trace ID shown in logs
const TRACE_ID_LEN: usize = 6;

/// Placeholder used by layers that run without a trace context
pub const UNTRACED: &str = "??????";

/// Six lowercase hex characters, random per request
pub fn generate_trace_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(TRACE_ID_LEN);
    id
}

#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub method: String,
    pub path: String,
    /// JSON-RPC method of the (first) message in the body
    pub mcp_method: Option<String>,
    pub session_id: Option<String>,
    pub started_at: Instant,
}

impl TraceContext {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            trace_id: generate_trace_id(),
            method: method.to_string(),
            path: path.to_string(),
            mcp_method: None,
            session_id: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_mcp_method(self, mcp_method: Option<String>) -> Self {
        Self { mcp_method, ..self }
    }

    pub fn with_session(self, session_id: Option<String>) -> Self {
        Self { session_id, ..self }
    }

    /// Trace ID of a request's context, or [`UNTRACED`]
    pub fn id_of(extensions: &http::Extensions) -> String {
        extensions
            .get::<TraceContext>()
            .map(|ctx| ctx.trace_id.clone())
            .unwrap_or_else(|| UNTRACED.to_string())
    }

    /// `/mcp` and `/mcp-test`
    pub fn is_mcp(&self) -> bool {
        self.path.starts_with(MCP_ENDPOINT)
    }

    pub fn short_session(&self) -> &str {
        match &self.session_id {
            Some(id) => id.get(..8).unwrap_or(id),
            None => "none",
        }
    }

    pub fn span(&self) -> Span {
        info_span!("request", trace_id = %self.trace_id, method = %self.method, path = %self.path)
    }

    pub fn log_request(&self) {
        if self.is_mcp() {
            info!(
                trace_id = %self.trace_id,
                mcp_method = self.mcp_method.as_deref().unwrap_or("-"),
                session = self.short_session(),
                "→ {} {}",
                self.method,
                self.path
            );
        } else {
            info!(trace_id = %self.trace_id, "→ {} {}", self.method, self.path);
        }
    }

    pub fn log_response(&self, status: u16) {
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        match &self.mcp_method {
            Some(m) => info!(trace_id = %self.trace_id, elapsed_ms, "← {} {}", status, m),
            None => info!(trace_id = %self.trace_id, elapsed_ms, "← {}", status),
        }
    }
}
