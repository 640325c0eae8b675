//! Test: notifications reach connected clients over SSE

use parking_lot::Mutex;
use rmcp::{
    model::{ClientCapabilities, ClientInfo, Implementation, LoggingMessageNotificationParam},
    service::NotificationContext,
    RoleClient,
};
use std::sync::Arc;
use std::time::Duration;
use tests::{connect_with, init_test_tracing, wait_until, TestGateway};
use tokio::sync::Notify;
use vacation_gateway::GatewayConfig;

/// Client handler that records every notification it receives
#[derive(Clone, Default)]
struct RecordingClient {
    tools_changed: Arc<Notify>,
    log_messages: Arc<Mutex<Vec<String>>>,
}

impl rmcp::ClientHandler for RecordingClient {
    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "recording-client".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn on_tool_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        self.tools_changed.notify_one();
        async {}
    }

    fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        let message = match &params.data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.log_messages.lock().push(message);
        async {}
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tool_heartbeat_reaches_client() {
    init_test_tracing();
    let gateway = TestGateway::start(GatewayConfig {
        tool_refresh_interval: Duration::from_millis(300),
        ..GatewayConfig::default()
    })
    .await;

    let handler = RecordingClient::default();
    let tools_changed = handler.tools_changed.clone();
    let client = connect_with(&gateway.mcp_test_url(), None, handler).await;

    let received = tokio::time::timeout(Duration::from_secs(5), tools_changed.notified()).await;
    assert!(
        received.is_ok(),
        "client should receive tools/list_changed within 5s"
    );

    client.cancel().await.ok();
    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notification_stream_receives_burst() {
    init_test_tracing();
    let gateway = TestGateway::start(GatewayConfig {
        burst_interval: Duration::from_millis(50),
        ..GatewayConfig::default()
    })
    .await;

    let handler = RecordingClient::default();
    let log_messages = handler.log_messages.clone();
    let client = connect_with(&gateway.mcp_test_url(), None, handler).await;

    let complete = wait_until(Duration::from_secs(5), || {
        log_messages
            .lock()
            .iter()
            .any(|m| m == "Streaming complete!")
    })
    .await;
    assert!(complete, "burst should finish, got {:?}", log_messages.lock());

    let messages = log_messages.lock().clone();
    assert_eq!(messages.len(), 4, "{:?}", messages);
    assert_eq!(messages[0], "SSE Connection established");
    assert!(messages[1].starts_with("Message 1 at "), "{}", messages[1]);
    assert!(messages[2].starts_with("Message 2 at "), "{}", messages[2]);
    assert!(messages[1].ends_with('Z'));
    assert_eq!(messages[3], "Streaming complete!");

    client.cancel().await.ok();
    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_session_receives_heartbeat() {
    let gateway = TestGateway::start(GatewayConfig {
        tool_refresh_interval: Duration::from_millis(300),
        ..GatewayConfig::default()
    })
    .await;

    let first = RecordingClient::default();
    let second = RecordingClient::default();
    let first_changed = first.tools_changed.clone();
    let second_changed = second.tools_changed.clone();
    let client_a = connect_with(&gateway.mcp_test_url(), None, first).await;
    let client_b = connect_with(&gateway.mcp_test_url(), None, second).await;
    assert_eq!(gateway.sessions.len(), 2);

    let both = tokio::time::timeout(Duration::from_secs(5), async {
        first_changed.notified().await;
        second_changed.notified().await;
    })
    .await;
    assert!(both.is_ok(), "both sessions should be notified");

    client_a.cancel().await.ok();
    client_b.cancel().await.ok();
    gateway.stop().await;
}
