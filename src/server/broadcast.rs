//! Fan-out of one message to every connected client.

use super::registry::ConnectionRegistry;
use crate::MessageEnvelope;
use futures::future::join_all;
use tracing::{debug, error};

/// Deliver `envelope` to every registered connection concurrently.
///
/// The envelope is encoded once. Each delivery is independent: a connection
/// that fails (closed mid-send, peer gone) is skipped without delaying the
/// others. Returns the number of successful deliveries; an empty registry
/// is a no-op returning 0.
pub async fn broadcast(registry: &ConnectionRegistry, envelope: &MessageEnvelope) -> usize {
    let connections = registry.snapshot();
    if connections.is_empty() {
        return 0;
    }

    let text = match envelope.to_json() {
        Ok(text) => text,
        Err(e) => {
            error!(msg_type = %envelope.kind, error = %e, "broadcast_encode_failed");
            return 0;
        }
    };

    let deliveries = connections.iter().map(|conn| {
        let text = text.as_str();
        async move {
            match conn.send_text(text).await {
                Ok(()) => true,
                Err(e) => {
                    debug!(client = %conn.remote_addr(), id = %conn.id(), error = %e, "broadcast_delivery_failed");
                    false
                }
            }
        }
    });

    let delivered = join_all(deliveries).await.into_iter().filter(|ok| *ok).count();
    debug!(
        msg_type = %envelope.kind,
        delivered,
        total = connections.len(),
        "broadcast_complete"
    );
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::registry::test_support::{addr, channel_outbound};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let registry = ConnectionRegistry::new();
        let delivered = broadcast(&registry, &MessageEnvelope::error("x")).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_delivers_to_every_connection() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for port in 6000..6003 {
            let (out, rx) = channel_outbound();
            registry.add(addr(port), out);
            receivers.push(rx);
        }

        let envelope = MessageEnvelope::with_field("tools_changed", "count", 3);
        assert_eq!(broadcast(&registry, &envelope).await, 3);

        for rx in &mut receivers {
            let frame = rx.next().await.unwrap();
            let got = MessageEnvelope::from_json(frame.to_text().unwrap()).unwrap();
            assert_eq!(got, envelope);
        }
    }

    #[tokio::test]
    async fn test_closed_connection_does_not_block_others() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = channel_outbound();
        let (b, rx_b) = channel_outbound();
        let (c, mut rx_c) = channel_outbound();
        registry.add(addr(6000), a);
        registry.add(addr(6001), b);
        registry.add(addr(6002), c);
        drop(rx_b);

        let envelope = MessageEnvelope::with_field("notice", "text", "hello");
        assert_eq!(broadcast(&registry, &envelope).await, 2);

        assert!(rx_a.next().await.is_some());
        assert!(rx_c.next().await.is_some());
        // the dead connection stays registered until its reader notices
        assert_eq!(registry.len(), 3);
    }
}
