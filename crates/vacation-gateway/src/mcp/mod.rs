//! MCP protocol surface: handler, tool registry and tool dispatch

pub mod context;
mod dispatch;
mod handler;
mod tools;

pub use context::{extract_caller, extract_session_id};
pub use dispatch::Dispatcher;
pub use handler::VacationGatewayHandler;
pub use tools::ToolRegistry;
