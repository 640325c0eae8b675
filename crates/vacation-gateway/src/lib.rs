//! Vacation MCP Gateway
//!
//! Exposes the vacation workflow tools to MCP clients over Streamable HTTP:
//! - Bearer-token authentication with per-request caller context
//! - Session guard and registry with idle expiry
//! - Tool registry with a periodic `list_changed` heartbeat
//! - Dispatch of tool calls to the downstream vacation REST API

pub mod api;
pub mod auth;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod notifier;
pub mod server;
pub mod session;

pub use api::{ApiClientConfig, ApiOverrides, VacationApiClient};
pub use auth::AuthSettings;
pub use error::GatewayError;
pub use mcp::{Dispatcher, ToolRegistry, VacationGatewayHandler};
pub use notifier::Notifier;
pub use server::{GatewayConfig, GatewayServer};
pub use session::{SessionRegistry, SESSION_ID_HEADER};
