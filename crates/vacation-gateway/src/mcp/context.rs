//! Per-request context carried from the HTTP layer into MCP handlers

use rmcp::model::Extensions;
use vacation_core::CallerContext;

use crate::session::SESSION_ID_HEADER;

/// Caller identity injected by the bearer-auth middleware
///
/// rmcp stores the originating `http::request::Parts` in the request
/// extensions; the auth middleware put the `CallerContext` in the
/// extensions of those parts. `None` on unauthenticated routes.
pub fn extract_caller(extensions: &Extensions) -> Option<CallerContext> {
    extensions
        .get::<http::request::Parts>()
        .and_then(|parts| parts.extensions.get::<CallerContext>())
        .cloned()
}

/// Extract session ID from request headers
pub fn extract_session_id(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<http::request::Parts>()
        .and_then(|parts| parts.headers.get(SESSION_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
