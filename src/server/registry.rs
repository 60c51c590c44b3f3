//! Registry of live client connections.

use crate::server::ServerError;
use crate::MessageEnvelope;
use futures::{Sink, SinkExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Outbound half of a connection.
pub type Outbound = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Registry-assigned connection identifier, unique per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

struct Connection {
    id: ConnectionId,
    remote_addr: SocketAddr,
    outbound: tokio::sync::Mutex<Outbound>,
}

/// Shared handle to one registered connection.
///
/// Replies and broadcasts to the same connection are serialized through the
/// handle, so frames are never interleaved.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<Connection>,
}

impl ConnectionHandle {
    /// Registry id.
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Peer address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.inner.remote_addr
    }

    /// Send an already-encoded text frame.
    pub async fn send_text(&self, text: &str) -> Result<(), ServerError> {
        let mut outbound = self.inner.outbound.lock().await;
        outbound.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    /// Encode and send one envelope.
    pub async fn send(&self, envelope: &MessageEnvelope) -> Result<(), ServerError> {
        self.send_text(&envelope.to_json()?).await
    }

    /// Flush and close the outbound half.
    pub async fn close(&self) -> Result<(), ServerError> {
        let mut outbound = self.inner.outbound.lock().await;
        outbound.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("remote_addr", &self.inner.remote_addr)
            .finish()
    }
}

/// The live set of connected clients.
///
/// A connection is present from admission until its socket closes. The
/// registry is the only shared mutable state in the server; its lock is
/// never held across an await, so [`snapshot`](Self::snapshot) can be
/// iterated while other tasks add or remove connections.
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<HashMap<ConnectionId, ConnectionHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection and return its handle.
    pub fn add(&self, remote_addr: SocketAddr, outbound: Outbound) -> ConnectionHandle {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = ConnectionHandle {
            inner: Arc::new(Connection {
                id,
                remote_addr,
                outbound: tokio::sync::Mutex::new(outbound),
            }),
        };
        self.lock().insert(id, handle.clone());
        handle
    }

    /// Remove a connection. Returns `false` if it was not registered.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Handles to every registered connection, in id order.
    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        let mut handles: Vec<_> = self.lock().values().cloned().collect();
        handles.sort_by_key(ConnectionHandle::id);
        handles
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, ConnectionHandle>> {
        // a poisoned map is still structurally valid
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Outbound;
    use futures::channel::mpsc;
    use futures::SinkExt;
    use std::net::SocketAddr;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    pub(crate) fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    /// Channel-backed outbound; dropping the receiver simulates a dead peer.
    pub(crate) fn channel_outbound() -> (Outbound, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded();
        let outbound: Outbound = Box::pin(tx.sink_map_err(|_| WsError::ConnectionClosed));
        (outbound, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{addr, channel_outbound};
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_add_and_remove() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty());

        let (out, _rx) = channel_outbound();
        let handle = registry.add(addr(5000), out);
        assert_eq!(registry.len(), 1);
        assert_eq!(handle.remote_addr(), addr(5000));

        assert!(registry.remove(handle.id()));
        assert!(!registry.remove(handle.id()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = channel_outbound();
        let (b, _rb) = channel_outbound();
        let first = registry.add(addr(5000), a);
        let second = registry.add(addr(5000), b);
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_snapshot_survives_removal() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for port in 5000..5003 {
            let (out, rx) = channel_outbound();
            ids.push(registry.add(addr(port), out).id());
            receivers.push(rx);
        }

        let snapshot = registry.snapshot();
        registry.remove(ids[1]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.iter().map(|h| h.id()).collect::<Vec<_>>(), ids);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ConnectionRegistry::new();
        let other = registry.clone();
        let (out, _rx) = channel_outbound();
        registry.add(addr(5000), out);
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn test_send_envelope() {
        let registry = ConnectionRegistry::new();
        let (out, mut rx) = channel_outbound();
        let handle = registry.add(addr(5000), out);

        handle.send(&MessageEnvelope::error("boom")).await.unwrap();

        let frame = rx.next().await.unwrap();
        assert_eq!(
            frame.into_text().unwrap().as_str(),
            r#"{"type":"error","payload":{"message":"boom"}}"#
        );
    }

    #[tokio::test]
    async fn test_close_ends_outbound() {
        let registry = ConnectionRegistry::new();
        let (out, mut rx) = channel_outbound();
        let handle = registry.add(addr(5000), out);

        handle.send_text("last").await.unwrap();
        handle.close().await.unwrap();

        assert_eq!(rx.next().await.unwrap().into_text().unwrap().as_str(), "last");
        assert!(rx.next().await.is_none());
        assert!(handle.send_text("{}").await.is_err());
    }

    #[tokio::test]
    async fn test_send_to_dead_peer_fails() {
        let registry = ConnectionRegistry::new();
        let (out, rx) = channel_outbound();
        let handle = registry.add(addr(5000), out);
        drop(rx);

        let err = handle.send_text("{}").await.unwrap_err();
        assert!(matches!(err, ServerError::WebSocket(WsError::ConnectionClosed)));
    }
}
