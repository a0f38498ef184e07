//! Session registry: identity → live session.
//!
//! Holds at most one entry per identity. Registration is an unconditional
//! upsert; removal is compare-and-remove on the connection ID so that a
//! stale session tearing down never evicts a newer one that reused its
//! identity.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::session::Outbound;

/// A registered session reachable by identity.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Server-assigned connection ID, unique for the life of the process.
    pub conn_id: u64,
    /// Identity the session declared.
    pub identity: String,
    /// Write side of the session's connection.
    pub outbound: Outbound,
    /// When the session registered.
    pub registered_at: Instant,
}

/// Registry of identified sessions.
pub struct SessionRegistry {
    /// Sessions indexed by identity.
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    /// Monotonic connection ID counter.
    next_conn_id: AtomicU64,
}

impl SessionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh connection ID.
    pub fn next_conn_id(&self) -> u64 {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a session under `identity`, replacing any existing entry.
    ///
    /// Returns the handle that was displaced, if any. The displaced
    /// connection is left open.
    pub async fn register(
        &self,
        identity: String,
        conn_id: u64,
        outbound: Outbound,
    ) -> Option<SessionHandle> {
        let handle = SessionHandle {
            conn_id,
            identity: identity.clone(),
            outbound,
            registered_at: Instant::now(),
        };

        let previous = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(identity.clone(), handle)
        };

        match &previous {
            Some(old) => info!(
                identity = %identity,
                conn_id,
                replaced_conn_id = old.conn_id,
                replaced_online_secs = old.registered_at.elapsed().as_secs(),
                "session re-registered, replacing previous connection"
            ),
            None => info!(identity = %identity, conn_id, "session registered"),
        }

        previous
    }

    /// Look up the live session for `identity`.
    pub async fn lookup(&self, identity: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(identity).cloned()
    }

    /// Remove `identity` only if it still maps to `conn_id`.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn unregister(&self, identity: &str, conn_id: u64) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(identity) {
            Some(entry) if entry.conn_id == conn_id => {
                let online_secs = entry.registered_at.elapsed().as_secs();
                sessions.remove(identity);
                debug!(identity = %identity, conn_id, online_secs, "session unregistered");
                true
            }
            Some(entry) => {
                debug!(
                    identity = %identity,
                    conn_id,
                    current_conn_id = entry.conn_id,
                    "identity owned by a newer session, leaving it registered"
                );
                false
            }
            None => false,
        }
    }

    /// Identities currently online.
    pub async fn snapshot(&self) -> BTreeSet<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Number of registered sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> Outbound {
        let (_client, server) = tokio::io::duplex(64);
        Outbound::new(server)
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = SessionRegistry::new();
        let id = registry.next_conn_id();
        assert!(registry.register("alice".into(), id, outbound()).await.is_none());

        let handle = registry.lookup("alice").await.unwrap();
        assert_eq!(handle.conn_id, id);
        assert_eq!(handle.identity, "alice");
        assert!(registry.lookup("bob").await.is_none());
    }

    #[tokio::test]
    async fn conn_ids_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.next_conn_id();
        let b = registry.next_conn_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn reregister_overwrites() {
        let registry = SessionRegistry::new();
        let first = registry.next_conn_id();
        let second = registry.next_conn_id();
        registry.register("alice".into(), first, outbound()).await;
        let displaced = registry.register("alice".into(), second, outbound()).await;

        assert_eq!(displaced.map(|h| h.conn_id), Some(first));
        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.lookup("alice").await.unwrap().conn_id, second);
    }

    #[tokio::test]
    async fn stale_unregister_keeps_newer_session() {
        let registry = SessionRegistry::new();
        let first = registry.next_conn_id();
        let second = registry.next_conn_id();
        registry.register("alice".into(), first, outbound()).await;
        registry.register("alice".into(), second, outbound()).await;

        assert!(!registry.unregister("alice", first).await);
        assert_eq!(registry.lookup("alice").await.unwrap().conn_id, second);

        assert!(registry.unregister("alice", second).await);
        assert!(registry.lookup("alice").await.is_none());
    }

    #[tokio::test]
    async fn unregister_missing_is_noop() {
        let registry = SessionRegistry::new();
        assert!(!registry.unregister("ghost", 7).await);
    }

    #[tokio::test]
    async fn snapshot_lists_identities() {
        let registry = SessionRegistry::new();
        for name in ["carol", "alice", "bob"] {
            let id = registry.next_conn_id();
            registry.register(name.into(), id, outbound()).await;
        }
        let online: Vec<_> = registry.snapshot().await.into_iter().collect();
        assert_eq!(online, vec!["alice", "bob", "carol"]);
    }
}
