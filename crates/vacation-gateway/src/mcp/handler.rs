//! Vacation Gateway MCP Handler
//!
//! Implements the MCP ServerHandler trait: advertises the vacation tools,
//! forwards tool calls to the dispatcher and hands each session's peer to
//! the session registry for notification delivery.

use rmcp::{
    model::*,
    service::{NotificationContext, RequestContext},
    ErrorData as McpError, RoleServer, ServerHandler,
};
use tracing::{debug, info, warn};
use vacation_core::branding::SERVER_NAME;

use super::context::{extract_caller, extract_session_id};
use super::{Dispatcher, ToolRegistry};
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct VacationGatewayHandler {
    tools: ToolRegistry,
    dispatcher: Dispatcher,
    sessions: SessionRegistry,
}

impl VacationGatewayHandler {
    pub fn new(tools: ToolRegistry, dispatcher: Dispatcher, sessions: SessionRegistry) -> Self {
        Self {
            tools,
            dispatcher,
            sessions,
        }
    }

    /// Make sure the session's peer is known to the registry
    ///
    /// `on_initialized` normally attaches it; requests that arrive on a
    /// session whose peer is missing attach it here.
    fn observe_peer(&self, extensions: &Extensions, peer: &rmcp::service::Peer<RoleServer>) {
        if let Some(session_id) = extract_session_id(extensions) {
            if !self.sessions.has_peer(&session_id) {
                self.sessions.attach_peer(&session_id, peer.clone());
            }
        }
    }
}

impl ServerHandler for VacationGatewayHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_logging()
                .enable_tools_with(ToolsCapability {
                    list_changed: Some(true),
                })
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Consulta e gerencia férias: veja suas férias, inicie um fluxo, \
                 consulte requisitos e avance etapas."
                    .to_string(),
            ),
        }
    }

    async fn on_initialized(&self, context: NotificationContext<RoleServer>) {
        let Some(session_id) = extract_session_id(&context.extensions) else {
            warn!("Client initialized without a session ID; notifications disabled");
            return;
        };

        if self.sessions.attach_peer(&session_id, context.peer) {
            info!(
                session_id = %session_id,
                "Client initialized - peer registered for notifications"
            );
        } else {
            warn!(session_id = %session_id, "Client initialized on an unregistered session");
        }
    }

    async fn set_level(
        &self,
        request: SetLevelRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<(), McpError> {
        self.observe_peer(&context.extensions, &context.peer);
        debug!(level = ?request.level, "logging/setLevel");
        Ok(())
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        self.observe_peer(&context.extensions, &context.peer);

        let tools = self.tools.list();
        debug!(count = tools.len(), "list_tools");
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.observe_peer(&context.extensions, &context.peer);
        let caller = extract_caller(&context.extensions);

        info!(
            tool = %params.name,
            vault = caller
                .as_ref()
                .and_then(|c| c.payload.vault_id.as_deref())
                .unwrap_or("anonymous"),
            "call_tool"
        );

        match self
            .dispatcher
            .dispatch(&params.name, params.arguments.as_ref(), caller.as_ref())
            .await
        {
            Ok(text) => {
                debug!(tool = %params.name, chars = text.chars().count(), "call_tool result");
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                Err(e.into())
            }
        }
    }
}
