//! Session Registry - live MCP sessions and their delivery handles
//!
//! rmcp's `LocalSessionManager` owns the protocol state of each session; this
//! registry tracks what the gateway itself needs on top of it:
//!
//! - **Admission**: which session IDs the session guard lets through
//! - **Delivery**: the peer used for server-initiated notifications
//! - **Lifecycle**: idle timestamps and a per-session cancellation token that
//!   stops any background delivery when the session goes away

mod guard;

pub use guard::{is_initialize_request, session_guard_middleware, SessionGuard};

use parking_lot::RwLock;
use rmcp::{service::Peer, RoleServer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Header carrying the session ID on every post-initialize request
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

struct SessionEntry {
    last_seen: Instant,
    peer: Option<Peer<RoleServer>>,
    cancel: CancellationToken,
}

/// Point-in-time view of one session
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub peer: Option<Peer<RoleServer>>,
    pub cancel: CancellationToken,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    /// Parent of every per-session token
    shutdown: CancellationToken,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl SessionRegistry {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shutdown,
        }
    }

    /// Register a freshly minted session ID
    ///
    /// Returns `false` if the ID was already registered; the existing entry
    /// is kept untouched.
    pub fn create(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(session_id) {
            return false;
        }

        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                last_seen: Instant::now(),
                peer: None,
                cancel: self.shutdown.child_token(),
            },
        );
        info!(
            session_id = %session_id,
            total_sessions = sessions.len(),
            "[Sessions] Session registered"
        );
        true
    }

    pub fn lookup(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .get(session_id)
            .map(|entry| SessionHandle {
                session_id: session_id.to_string(),
                peer: entry.peer.clone(),
                cancel: entry.cancel.clone(),
            })
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Record activity on a session; `false` if the ID is unknown
    pub fn touch(&self, session_id: &str) -> bool {
        match self.sessions.write().get_mut(session_id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Attach the notification peer once the client has initialized
    pub fn attach_peer(&self, session_id: &str, peer: Peer<RoleServer>) -> bool {
        match self.sessions.write().get_mut(session_id) {
            Some(entry) => {
                let replaced = entry.peer.replace(peer).is_some();
                debug!(session_id = %session_id, replaced, "[Sessions] Peer attached");
                true
            }
            None => false,
        }
    }

    pub fn has_peer(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .get(session_id)
            .is_some_and(|entry| entry.peer.is_some())
    }

    pub fn peer(&self, session_id: &str) -> Option<Peer<RoleServer>> {
        self.sessions
            .read()
            .get(session_id)
            .and_then(|entry| entry.peer.clone())
    }

    /// Remove a session and cancel its background delivery
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id);
        match removed {
            Some(entry) => {
                entry.cancel.cancel();
                info!(
                    session_id = %session_id,
                    remaining_sessions = self.len(),
                    "[Sessions] Session removed"
                );
                true
            }
            None => false,
        }
    }

    /// Remove every session idle for at least `ttl`; returns the evicted IDs
    pub fn evict_idle(&self, ttl: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.write();

        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_seen) >= ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(entry) = sessions.remove(id) {
                entry.cancel.cancel();
            }
        }

        if !expired.is_empty() {
            info!(
                evicted = expired.len(),
                remaining_sessions = sessions.len(),
                "[Sessions] Evicted idle sessions"
            );
        }
        expired
    }

    /// Sessions that can receive notifications
    pub fn open_peers(&self) -> Vec<(String, Peer<RoleServer>)> {
        self.sessions
            .read()
            .iter()
            .filter_map(|(id, entry)| entry.peer.clone().map(|peer| (id.clone(), peer)))
            .collect()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Drop every session, returning their IDs
    pub fn clear(&self) -> Vec<String> {
        let drained: Vec<(String, SessionEntry)> = self.sessions.write().drain().collect();
        drained
            .into_iter()
            .map(|(id, entry)| {
                entry.cancel.cancel();
                id
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
