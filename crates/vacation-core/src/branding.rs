//! Product naming and fixed defaults

/// Server name reported in MCP `initialize`
pub const SERVER_NAME: &str = "mcp-server-vacation";

/// Human-readable product name (logs, CLI help)
pub const DISPLAY_NAME: &str = "MCP Vacation Server";

/// Prefix for rolling log files (e.g. `vacation-mcp.2025-01-01.log`)
pub const LOG_PREFIX: &str = "vacation-mcp";

/// Default listening port
pub const DEFAULT_PORT: u16 = 3001;

/// Downstream API base URL when neither an override nor the token supplies one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// `x-api-token` when no caller credential or override is available
pub const DEFAULT_USER_SECRET: &str = "default-secret";

/// `x-api-id` when no caller identifier or override is available
pub const DEFAULT_USER_ID: &str = "default-user";

/// Authenticated MCP endpoint
pub const MCP_ENDPOINT: &str = "/mcp";

/// Unauthenticated MCP endpoint (local testing)
pub const MCP_TEST_ENDPOINT: &str = "/mcp-test";
