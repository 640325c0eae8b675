//! Notifier - server-initiated messages to connected MCP clients
//!
//! Two delivery paths share the session registry's peers:
//!
//! - **Tool heartbeat**: every refresh interval the tool registry is rebuilt
//!   and every open session receives `notifications/tools/list_changed`
//! - **Stream burst**: when a client opens its notification stream it gets a
//!   short sequence of log messages, cancelled with the session

use chrono::{SecondsFormat, Utc};
use rmcp::{
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
    RoleServer,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vacation_core::branding::LOG_PREFIX;

use crate::mcp::ToolRegistry;
use crate::session::SessionRegistry;

/// Default period of the tool heartbeat
pub const TOOL_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Spacing of the numbered burst messages
pub const BURST_INTERVAL: Duration = Duration::from_secs(1);

/// Numbered messages sent between the greeting and the completion message
const BURST_MESSAGES: u32 = 2;

/// How long a burst waits for `notifications/initialized` to attach the peer
const PEER_WAIT: Duration = Duration::from_secs(2);
const PEER_POLL: Duration = Duration::from_millis(25);

#[derive(Clone)]
pub struct Notifier {
    sessions: SessionRegistry,
    tools: ToolRegistry,
    burst_interval: Duration,
}

impl Notifier {
    pub fn new(sessions: SessionRegistry, tools: ToolRegistry) -> Self {
        Self {
            sessions,
            tools,
            burst_interval: BURST_INTERVAL,
        }
    }

    pub fn with_burst_interval(mut self, interval: Duration) -> Self {
        self.burst_interval = interval;
        self
    }

    /// Send `tools/list_changed` to every session with a peer
    ///
    /// Returns the number of sessions that accepted the notification.
    pub async fn broadcast_tool_list_changed(&self) -> usize {
        let peers = self.sessions.open_peers();
        if peers.is_empty() {
            debug!("[Notifier] No open sessions to notify about tools");
            return 0;
        }

        let mut delivered = 0;
        for (session_id, peer) in peers {
            match peer.notify_tool_list_changed().await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        error = ?e,
                        "[Notifier] Failed to send tools/list_changed"
                    )
                }
            }
        }

        debug!(delivered, "[Notifier] Sent tools/list_changed");
        delivered
    }

    /// Refresh the tool registry and broadcast `list_changed` until shutdown
    pub fn spawn_tool_heartbeat(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let notifier = self.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "[Notifier] Tool heartbeat started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let generation = notifier.tools.refresh();
                        debug!(generation, "[Notifier] Tool registry refreshed");
                        notifier.broadcast_tool_list_changed().await;
                    }
                }
            }

            info!("[Notifier] Tool heartbeat stopped");
        })
    }

    /// Start the greeting burst on a freshly opened notification stream
    ///
    /// The stream can open before the client's `initialized` notification has
    /// been handled, so the burst waits up to [`PEER_WAIT`] for the peer.
    /// Returns `None` when the session is unknown.
    pub fn start_stream_burst(&self, session_id: &str) -> Option<JoinHandle<()>> {
        let Some(handle) = self.sessions.lookup(session_id) else {
            debug!(session_id = %session_id, "[Notifier] Burst skipped, unknown session");
            return None;
        };

        let cancel = handle.cancel.child_token();
        let interval = self.burst_interval;
        let sessions = self.sessions.clone();
        let session_id = session_id.to_string();

        Some(tokio::spawn(async move {
            let peer = match handle.peer {
                Some(peer) => peer,
                None => match wait_for_peer(&sessions, &session_id, &cancel).await {
                    Some(peer) => peer,
                    None => {
                        debug!(
                            session_id = %session_id,
                            "[Notifier] Burst skipped, session not initialized"
                        );
                        return;
                    }
                },
            };

            if let Err(e) = run_burst(&peer, interval, &cancel).await {
                debug!(session_id = %session_id, error = %e, "[Notifier] Burst ended early");
            }
        }))
    }
}

async fn wait_for_peer(
    sessions: &SessionRegistry,
    session_id: &str,
    cancel: &CancellationToken,
) -> Option<Peer<RoleServer>> {
    let deadline = tokio::time::Instant::now() + PEER_WAIT;
    loop {
        if let Some(peer) = sessions.peer(session_id) {
            return Some(peer);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(PEER_POLL) => {}
        }
    }
}

async fn run_burst(
    peer: &Peer<RoleServer>,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<(), rmcp::service::ServiceError> {
    send_log(peer, "SSE Connection established".to_string()).await?;

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    for count in 1..=BURST_MESSAGES {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        send_log(peer, format!("Message {} at {}", count, now)).await?;
    }

    if cancel.is_cancelled() {
        return Ok(());
    }
    send_log(peer, "Streaming complete!".to_string()).await
}

async fn send_log(
    peer: &Peer<RoleServer>,
    text: String,
) -> Result<(), rmcp::service::ServiceError> {
    peer.notify_logging_message(LoggingMessageNotificationParam {
        level: LoggingLevel::Info,
        logger: Some(LOG_PREFIX.to_string()),
        data: serde_json::Value::String(text),
    })
    .await
}
