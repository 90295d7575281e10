use crate::core::framing::Line;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque identifier of one connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// One connected network client
#[derive(Debug)]
pub struct ClientSession {
    id: SessionId,
    peer: Option<SocketAddr>,
    connected_at: std::time::SystemTime,
    outbound: mpsc::Sender<Line>,
    dropped: AtomicU64,
}

impl ClientSession {
    /// Create a session and the receiving end of its delivery queue
    pub fn new(peer: Option<SocketAddr>, capacity: usize) -> (Self, mpsc::Receiver<Line>) {
        let (outbound, inbox) = mpsc::channel(capacity);
        let session = Self {
            id: SessionId::new(),
            peer,
            connected_at: std::time::SystemTime::now(),
            outbound,
            dropped: AtomicU64::new(0),
        };
        (session, inbox)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            peer: self.peer,
            connected_at: self.connected_at,
            dropped_lines: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of a session for status reporting
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer: Option<SocketAddr>,
    pub connected_at: std::time::SystemTime,
    pub dropped_lines: u64,
}

/// Result of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that accepted the line
    pub delivered: usize,
    /// Sessions whose queue was full
    pub dropped: usize,
    /// Sessions found disconnected and removed
    pub removed: usize,
}

/// Currently connected clients
pub struct ClientRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, ClientSession>>>,
    queue_capacity: usize,
}

impl ClientRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Create and add a session for a newly connected peer
    pub async fn register(&self, peer: Option<SocketAddr>) -> (SessionId, mpsc::Receiver<Line>) {
        let (session, inbox) = ClientSession::new(peer, self.queue_capacity);
        let id = session.id();
        self.add(session).await;
        (id, inbox)
    }

    pub async fn add(&self, session: ClientSession) {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
        info!(session = %id, clients = sessions.len(), "Client registered");
    }

    /// Deregister a session; unknown ids are ignored
    pub async fn remove(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        if removed {
            info!(session = %id, clients = sessions.len(), "Client removed");
        }
        removed
    }

    /// Queue `line` for every registered session without waiting on any of them
    pub async fn broadcast(&self, line: &Line) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut stale = Vec::new();

        {
            let sessions = self.sessions.read().await;
            for session in sessions.values() {
                match session.outbound.try_send(line.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let total = session.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        warn!(session = %session.id, dropped = total, "Client queue full; dropping line");
                        report.dropped += 1;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(session.id),
                }
            }
        }

        if !stale.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in stale {
                if sessions.remove(&id).is_some() {
                    debug!(session = %id, "Removed disconnected client during broadcast");
                    report.removed += 1;
                }
            }
        }

        report
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions.values().map(ClientSession::info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Line {
        Line::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_remove() {
        let registry = ClientRegistry::new(8);
        assert!(registry.is_empty().await);

        let (id, _inbox) = registry.register(None).await;
        assert!(registry.contains(&id).await);
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_session_in_order() {
        let registry = ClientRegistry::new(8);
        let mut inboxes = Vec::new();
        for _ in 0..3 {
            inboxes.push(registry.register(None).await.1);
        }

        for text in ["12.5", "7"] {
            let report = registry.broadcast(&line(text)).await;
            assert_eq!(report.delivered, 3);
        }

        for inbox in inboxes.iter_mut() {
            assert_eq!(inbox.recv().await.unwrap().as_str(), "12.5");
            assert_eq!(inbox.recv().await.unwrap().as_str(), "7");
        }
    }

    #[tokio::test]
    async fn test_slow_client_does_not_block_others() {
        let registry = ClientRegistry::new(1);
        let (slow_id, _slow_inbox) = registry.register(None).await;
        let (_, mut fast_inbox) = registry.register(None).await;

        let first = registry.broadcast(&line("a")).await;
        assert_eq!(first.delivered, 2);
        assert_eq!(fast_inbox.recv().await.unwrap().as_str(), "a");

        let second = registry.broadcast(&line("b")).await;
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, 1);
        assert_eq!(fast_inbox.recv().await.unwrap().as_str(), "b");

        let info = registry
            .sessions()
            .await
            .into_iter()
            .find(|s| s.id == slow_id)
            .unwrap();
        assert_eq!(info.dropped_lines, 1);
    }

    #[tokio::test]
    async fn test_closed_session_removed_during_broadcast() {
        let registry = ClientRegistry::new(4);
        let (gone, gone_inbox) = registry.register(None).await;
        let (_, mut kept_inbox) = registry.register(None).await;
        drop(gone_inbox);

        let report = registry.broadcast(&line("x")).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert!(!registry.contains(&gone).await);
        assert_eq!(kept_inbox.recv().await.unwrap().as_str(), "x");
    }

    #[tokio::test]
    async fn test_session_info_carries_peer() {
        let registry = ClientRegistry::new(4);
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let (id, _inbox) = registry.register(Some(peer)).await;

        let sessions = registry.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].peer, Some(peer));
        assert_eq!(sessions[0].dropped_lines, 0);
    }
}
