//! Advisory edit-lock coordination across live connections.
//!
//! Each connection holds at most one claim (campaign, record, page);
//! claiming a new page implicitly releases the previous one, and the claim
//! dies with the connection. After every claim the coordinator pushes a
//! locked-pages notification to each connection editing the same
//! (campaign, record), listing the pages held by connections other than
//! the recipient. Locking is advisory: nothing prevents two connections
//! from claiming the same page; the broadcast only makes the collision
//! visible so the UI can warn the second editor.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use quire_core::lock::{EditLock, LockMessage, LockState, LockedPages};
use quire_core::types::{DbId, Timestamp};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// State for a single live editing connection.
struct Connection {
    /// Channel sender for outbound messages to this connection.
    sender: WsSender,
    /// The page this connection is currently editing, if any.
    claim: Option<EditLock>,
    /// When the last inbound frame arrived; drives the idle sweep.
    last_seen: Timestamp,
}

/// Tracks all live editing connections and their claims.
///
/// The connection map is the only shared mutable structure; a single
/// `RwLock` guards it so a broadcast always sees a consistent snapshot of
/// every claim. Constructed explicitly at startup and shared via `Arc`.
pub struct EditLockCoordinator {
    connections: RwLock<HashMap<String, Connection>>,
}

impl EditLockCoordinator {
    /// Create a new coordinator with no connections.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection under an explicitly issued identity.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn register(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            sender: tx,
            claim: None,
            last_seen: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Record that `conn_id` is now editing the page in `lock`, replacing
    /// any prior claim, then notify every connection sharing the claim's
    /// (campaign, record) of the current occupancy.
    ///
    /// A claim from an untracked connection is stale and ignored.
    pub async fn claim(&self, conn_id: &str, lock: EditLock) {
        let mut conns = self.connections.write().await;

        {
            let Some(conn) = conns.get_mut(conn_id) else {
                tracing::debug!(conn_id, "Claim from untracked connection ignored");
                return;
            };
            conn.last_seen = chrono::Utc::now();
            conn.claim = Some(lock.clone());
        }

        Self::broadcast_locked_pages(&conns, lock.campaign_id, &lock.record_id);
    }

    /// Drop the connection's current claim, if any.
    ///
    /// No broadcast: with the claim gone there is no (campaign, record)
    /// scope to compare against. Other editors learn of the freed page on
    /// their next claim.
    pub async fn release(&self, conn_id: &str) {
        let mut conns = self.connections.write().await;
        if let Some(conn) = conns.get_mut(conn_id) {
            conn.claim = None;
        }
    }

    /// Remove a connection entirely (disconnect). Its claim goes with it.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Refresh the inactivity clock for a connection.
    pub async fn touch(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.last_seen = chrono::Utc::now();
        }
    }

    /// Push a locked-pages notification to every connection whose claim is
    /// in the given (campaign, record) scope. Each recipient receives the
    /// set of pages claimed by connections other than itself.
    fn broadcast_locked_pages(
        conns: &HashMap<String, Connection>,
        campaign_id: DbId,
        record_id: &str,
    ) {
        for (recipient_id, recipient) in conns {
            let Some(claim) = &recipient.claim else { continue };
            if !claim.same_record(campaign_id, record_id) {
                continue;
            }

            let locked: LockedPages = conns
                .iter()
                .filter(|(other_id, _)| *other_id != recipient_id)
                .filter_map(|(_, other)| other.claim.as_ref())
                .filter(|other_claim| other_claim.same_record(campaign_id, record_id))
                .map(|other_claim| (other_claim.page_index, LockState::Locked))
                .collect();

            let message = LockMessage::LockedPages {
                campaign_id,
                record_id: record_id.to_string(),
                locked,
            };
            match serde_json::to_string(&message) {
                // Closed channels are skipped; the receive loop cleans the
                // connection up on its next iteration.
                Ok(text) => {
                    let _ = recipient.sender.send(Message::Text(text.into()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize locked-pages message");
                }
            }
        }
    }

    /// Close and remove every connection whose last inbound frame is older
    /// than `idle_timeout`. Returns the number of connections closed.
    ///
    /// Absence of messages is the only cancellation signal these
    /// connections have, so a silent one is treated as gone.
    pub async fn sweep_idle(&self, idle_timeout: Duration) -> usize {
        let Ok(window) = chrono::Duration::from_std(idle_timeout) else {
            return 0;
        };
        let cutoff = chrono::Utc::now() - window;

        let mut conns = self.connections.write().await;
        let stale: Vec<String> = conns
            .iter()
            .filter(|(_, conn)| conn.last_seen < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for conn_id in &stale {
            if let Some(conn) = conns.remove(conn_id) {
                let _ = conn.sender.send(Message::Close(None));
                tracing::info!(conn_id, "Closed idle edit-lock connection");
            }
        }

        stale.len()
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all edit-lock connections");
    }
}

impl Default for EditLockCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
