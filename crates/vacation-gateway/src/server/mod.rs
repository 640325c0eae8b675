//! Gateway Server
//!
//! HTTP server exposing the vacation tools over MCP Streamable HTTP.
//! Owns the shared registries and the background tasks that keep them fresh.

mod handlers;
pub mod logging_middleware;

use axum::{middleware, routing::get, Router};
use rmcp::transport::streamable_http_server::{
    session::{local::LocalSessionManager, SessionManager},
    StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use vacation_core::branding::{DEFAULT_PORT, MCP_ENDPOINT, MCP_TEST_ENDPOINT};
use vacation_core::SigningSecret;

use crate::api::ApiOverrides;
use crate::auth::{bearer_auth_middleware, AuthSettings};
use crate::mcp::{Dispatcher, ToolRegistry, VacationGatewayHandler};
use crate::notifier::{Notifier, BURST_INTERVAL, TOOL_REFRESH_INTERVAL};
use crate::session::{session_guard_middleware, SessionGuard, SessionRegistry};

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS for browser access
    pub enable_cors: bool,
    /// Downstream API overrides
    pub api: ApiOverrides,
    /// Verify token signatures with this secret; decode-only when `None`
    pub signing_secret: Option<SigningSecret>,
    /// Sessions idle this long are closed
    pub session_idle_timeout: Duration,
    pub session_sweep_interval: Duration,
    pub tool_refresh_interval: Duration,
    /// Spacing between the messages of a notification burst
    pub burst_interval: Duration,
    pub sse_keep_alive: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            enable_cors: true,
            api: ApiOverrides::default(),
            signing_secret: None,
            session_idle_timeout: Duration::from_secs(30 * 60),
            session_sweep_interval: Duration::from_secs(60),
            tool_refresh_interval: TOOL_REFRESH_INTERVAL,
            burst_interval: BURST_INTERVAL,
            sse_keep_alive: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// `host:port` as given, for binding and logging
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Vacation MCP Gateway Server
pub struct GatewayServer {
    config: GatewayConfig,
    sessions: SessionRegistry,
    tools: ToolRegistry,
    notifier: Notifier,
    dispatcher: Dispatcher,
    session_manager: Arc<LocalSessionManager>,
    shutdown: CancellationToken,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        let shutdown = CancellationToken::new();
        let sessions = SessionRegistry::new(shutdown.clone());
        let tools = ToolRegistry::new();
        let notifier = Notifier::new(sessions.clone(), tools.clone())
            .with_burst_interval(config.burst_interval);
        let dispatcher = Dispatcher::new(config.api.clone());

        info!(tools = tools.list().len(), "[Gateway] Initialized");

        Self {
            config,
            sessions,
            tools,
            notifier,
            dispatcher,
            session_manager: Arc::new(LocalSessionManager::default()),
            shutdown,
        }
    }

    pub fn sessions(&self) -> SessionRegistry {
        self.sessions.clone()
    }

    /// Cancel this token to stop the server gracefully
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn mcp_service(
        &self,
        handler: VacationGatewayHandler,
    ) -> StreamableHttpService<VacationGatewayHandler, LocalSessionManager> {
        StreamableHttpService::new(
            move || {
                debug!("[Gateway] Creating handler instance for MCP session");
                Ok(handler.clone())
            },
            self.session_manager.clone(),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: Some(self.config.sse_keep_alive),
                sse_retry: Some(Duration::from_secs(3)),
                cancellation_token: self.shutdown.child_token(),
            },
        )
    }

    /// Build the Axum router
    ///
    /// `/mcp` requires a bearer token; `/mcp-test` is the same service
    /// without authentication. Both share one session registry.
    pub fn build_router(&self) -> Router {
        let handler = VacationGatewayHandler::new(
            self.tools.clone(),
            self.dispatcher.clone(),
            self.sessions.clone(),
        );
        let guard = SessionGuard {
            registry: self.sessions.clone(),
            notifier: self.notifier.clone(),
        };
        let auth = Arc::new(AuthSettings {
            signing_secret: self.config.signing_secret.clone(),
        });

        let mcp_routes = Router::new()
            .nest_service(MCP_ENDPOINT, self.mcp_service(handler.clone()))
            .layer(middleware::from_fn_with_state(
                guard.clone(),
                session_guard_middleware,
            ))
            .layer(middleware::from_fn_with_state(auth, bearer_auth_middleware));

        let test_routes = Router::new()
            .nest_service(MCP_TEST_ENDPOINT, self.mcp_service(handler))
            .layer(middleware::from_fn_with_state(
                guard,
                session_guard_middleware,
            ));

        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .with_state(self.sessions.clone())
            .merge(mcp_routes)
            .merge(test_routes)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(
                logging_middleware::http_logging_middleware,
            ));

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the tool heartbeat and the idle-session sweeper
    pub fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.notifier
                .spawn_tool_heartbeat(self.config.tool_refresh_interval, self.shutdown.clone()),
            self.spawn_session_sweeper(),
        ]
    }

    fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        let manager = self.session_manager.clone();
        let shutdown = self.shutdown.clone();
        let ttl = self.config.session_idle_timeout;
        let every = self.config.session_sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        close_sessions(&manager, sessions.clear()).await;
                        break;
                    }
                    _ = ticker.tick() => {
                        close_sessions(&manager, sessions.evict_idle(ttl)).await;
                    }
                }
            }
            debug!("[Gateway] Session sweeper stopped");
        })
    }

    /// Serve on an already bound listener until the shutdown token fires
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!("[Gateway] Listening on {}", addr);
        info!(
            "[Gateway] CORS: {}",
            if self.config.enable_cors { "enabled" } else { "disabled" }
        );
        if self.config.signing_secret.is_some() {
            info!("[Gateway] Token signatures: verified");
        } else {
            warn!("[Gateway] Token signatures: NOT verified (no signing secret configured)");
        }

        let router = self.build_router();
        let tasks = self.spawn_background_tasks();

        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        // Serve may also end on an I/O error; stop the background tasks either way
        self.shutdown.cancel();
        for task in tasks {
            if let Err(e) = task.await {
                warn!("[Gateway] Background task failed: {}", e);
            }
        }

        served?;
        info!("[Gateway] Stopped");
        Ok(())
    }

    /// Bind the configured address and serve
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        self.serve(listener).await
    }
}

async fn close_sessions(manager: &LocalSessionManager, session_ids: Vec<String>) {
    for id in session_ids {
        let session_id: Arc<str> = Arc::from(id.as_str());
        if let Err(e) = manager.close_session(&session_id).await {
            debug!(session_id = %id, error = ?e, "[Gateway] Transport session already gone");
        }
    }
}
