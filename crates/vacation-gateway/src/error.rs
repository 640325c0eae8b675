//! Gateway error taxonomy and its HTTP / JSON-RPC renderings

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rmcp::ErrorData as McpError;
use thiserror::Error;
use vacation_core::{InputError, TokenError, UnknownTool, VacationTool};

/// JSON-RPC error code used for transport-level rejections
pub const SERVER_ERROR_CODE: i64 = -32000;

/// Message returned to clients when a tool call fails downstream
pub const TOOL_CALL_FAILED: &str = "Tool call failed";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing token or invalid format")]
    AuthMissing,

    #[error("{0}")]
    AuthInvalid(TokenError),

    #[error("failed to validate token: {0}")]
    AuthInternal(String),

    #[error("Bad Request: invalid session ID or method.")]
    SessionInvalid,

    #[error(transparent)]
    ToolNotFound(#[from] UnknownTool),

    #[error("invalid arguments for {tool}: {source}")]
    ToolInputInvalid {
        tool: VacationTool,
        #[source]
        source: InputError,
    },

    #[error("downstream request failed: {0}")]
    DownstreamFailure(String),
}

impl GatewayError {
    pub fn downstream(err: impl std::fmt::Display) -> Self {
        GatewayError::DownstreamFailure(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthMissing | GatewayError::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
            GatewayError::SessionInvalid
            | GatewayError::ToolNotFound(_)
            | GatewayError::ToolInputInvalid { .. } => StatusCode::BAD_REQUEST,
            GatewayError::AuthInternal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::DownstreamFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        if err.is_client_error() {
            GatewayError::AuthInvalid(err)
        } else {
            GatewayError::AuthInternal(err.to_string())
        }
    }
}

/// JSON-RPC error envelope for transport-level failures
///
/// There is no request id to echo at this layer, so a fresh UUID is used.
pub fn jsonrpc_error_body(message: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "error": {
            "code": SERVER_ERROR_CODE,
            "message": message,
        },
        "id": uuid::Uuid::new_v4().to_string(),
    })
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::AuthMissing | GatewayError::AuthInvalid(_) => (
                StatusCode::UNAUTHORIZED,
                [(
                    "WWW-Authenticate",
                    r#"Bearer realm="Vacation MCP", error="invalid_token""#,
                )],
                format!("Unauthorized: {}", self),
            )
                .into_response(),
            GatewayError::AuthInternal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error: failed to validate token",
            )
                .into_response(),
            _ => (self.status_code(), Json(jsonrpc_error_body(&self.to_string()))).into_response(),
        }
    }
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ToolNotFound(UnknownTool(name)) => {
                McpError::invalid_params(format!("Tool not found: {}", name), None)
            }
            GatewayError::ToolInputInvalid { tool, .. } => {
                McpError::invalid_params(format!("Invalid arguments for tool {}", tool), None)
            }
            GatewayError::DownstreamFailure(_) => McpError::internal_error(TOOL_CALL_FAILED, None),
            other => McpError::internal_error(other.to_string(), None),
        }
    }
}
