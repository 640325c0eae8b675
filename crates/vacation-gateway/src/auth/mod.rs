//! Bearer-token authentication for the MCP endpoint
//!
//! Validates `Authorization: Bearer <token>` and attaches the resulting
//! `CallerContext` to the request extensions, where the MCP handler reads it
//! back out of the transport's request parts. Nothing is stored outside the
//! request, so concurrent callers never observe each other's credentials.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vacation_core::{validate_token, SigningSecret};

use crate::error::GatewayError;
use crate::logging::TraceContext;

/// Token verification settings shared by every request
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// When set, token signatures are verified; otherwise tokens are only decoded
    pub signing_secret: Option<SigningSecret>,
}

impl AuthSettings {
    pub fn verifies_signatures(&self) -> bool {
        self.signing_secret.is_some()
    }
}

/// Pull the token out of an `Authorization` header value
///
/// The scheme must be exactly `Bearer`; the token is the next space-separated
/// segment.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let mut segments = header_value.split(' ');
    match (segments.next(), segments.next()) {
        (Some("Bearer"), Some(token)) => Some(token),
        _ => None,
    }
}

pub async fn bearer_auth_middleware(
    State(settings): State<Arc<AuthSettings>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Skip auth for OPTIONS (CORS preflight)
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let trace_id = TraceContext::id_of(request.extensions());

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        warn!(trace_id = %trace_id, "Missing or malformed Authorization header");
        return GatewayError::AuthMissing.into_response();
    };

    let caller = match validate_token(token, settings.signing_secret.as_ref()) {
        Ok(caller) => caller,
        Err(e) => {
            let err = GatewayError::from(e);
            warn!(trace_id = %trace_id, error = %err, "Token validation failed");
            return err.into_response();
        }
    };

    info!(
        trace_id = %trace_id,
        vault_id = caller.payload.vault_id.as_deref().unwrap_or("-"),
        vault_name = caller.payload.vault_name.as_deref().unwrap_or("-"),
        "Token validated"
    );
    debug!(
        trace_id = %trace_id,
        link = caller.payload.link.as_deref().unwrap_or("-"),
        "Token payload"
    );

    request.extensions_mut().insert(caller);
    next.run(request).await
}
