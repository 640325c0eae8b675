//! Shared test utilities and fixtures for the vacation MCP integration tests.

use rmcp::{
    model::{CallToolResult, ClientCapabilities, ClientInfo, Implementation},
    service::RunningService,
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig, StreamableHttpClientTransport,
    },
    RoleClient, ServiceExt,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vacation_core::{issue_token, SigningSecret, TokenPayload};
use vacation_gateway::{GatewayConfig, GatewayServer, SessionRegistry};

pub use vacation_core::derive_credential;

/// Secret used by fixtures; only matters when a test enables verification
pub const TEST_SIGNING_SECRET: &str = "integration-test-secret";

/// A gateway running on a random local port
pub struct TestGateway {
    pub base_url: String,
    pub sessions: SessionRegistry,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), String>>,
}

impl TestGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let server = GatewayServer::new(config);
        let sessions = server.sessions();
        let shutdown = server.shutdown_token();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to random port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            server.serve(listener).await.map_err(|e| format!("{:#}", e))
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", addr.port()),
            sessions,
            shutdown,
            handle,
        }
    }

    /// Gateway whose downstream API is `api_url` regardless of token contents
    pub async fn with_api(api_url: &str) -> Self {
        let mut config = GatewayConfig::default();
        config.api.base_url = Some(api_url.to_string());
        Self::start(config).await
    }

    pub fn mcp_url(&self) -> String {
        format!("{}/mcp", self.base_url)
    }

    pub fn mcp_test_url(&self) -> String {
        format!("{}/mcp-test", self.base_url)
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("gateway should stop within 10s")
            .expect("gateway task should not panic");
        assert!(result.is_ok(), "gateway stopped with error: {:?}", result);
    }
}

/// Token payload for a caller of the given vault and downstream user
pub fn caller_payload(vault_id: &str, identifier: &str, link: &str) -> TokenPayload {
    TokenPayload {
        vault_id: Some(vault_id.to_string()),
        vault_name: Some(format!("{} vault", vault_id)),
        link: Some(link.to_string()),
        key: Some(serde_json::json!({ "identifier": identifier })),
        access_time: Some("2025-01-01T00:00:00Z".to_string()),
        iat: Some(1_700_000_000),
        exp: None,
    }
}

/// Sign a payload with the fixture secret
pub fn bearer_token(payload: &TokenPayload) -> String {
    issue_token(payload, &SigningSecret::new(TEST_SIGNING_SECRET)).expect("token should sign")
}

/// Connected MCP client
pub type McpClient = RunningService<RoleClient, ClientInfo>;

fn client_info() -> ClientInfo {
    ClientInfo {
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "vacation-test-client".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// reqwest client that sends `Authorization: Bearer <token>` on every request
pub fn http_client(token: Option<&str>) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(token) = token {
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
    }
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}

/// Connect and initialize an MCP client
pub async fn connect(url: &str, token: Option<&str>) -> McpClient {
    let transport = StreamableHttpClientTransport::with_client(
        http_client(token),
        StreamableHttpClientTransportConfig::with_uri(url),
    );
    tokio::time::timeout(Duration::from_secs(5), client_info().serve(transport))
        .await
        .expect("client should connect within 5s")
        .expect("client should connect")
}

/// Connect with a custom client handler
pub async fn connect_with<H>(
    url: &str,
    token: Option<&str>,
    handler: H,
) -> RunningService<RoleClient, H>
where
    H: rmcp::ClientHandler,
{
    let transport = StreamableHttpClientTransport::with_client(
        http_client(token),
        StreamableHttpClientTransportConfig::with_uri(url),
    );
    tokio::time::timeout(Duration::from_secs(5), handler.serve(transport))
        .await
        .expect("client should connect within 5s")
        .expect("client should connect")
}

/// `tools/call` request parameters
pub fn call_params(name: &str, arguments: serde_json::Value) -> rmcp::model::CallToolRequestParams {
    serde_json::from_value(serde_json::json!({ "name": name, "arguments": arguments }))
        .expect("valid call params")
}

/// Concatenated text content of a tool result
pub fn result_text(result: &CallToolResult) -> String {
    let json = serde_json::to_value(result).expect("serializable result");
    json["content"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Install a test subscriber honoring `RUST_LOG` (idempotent)
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Block until `condition` holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
