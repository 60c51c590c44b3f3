//! WebSocket server: connection admission, per-connection dispatch loop and
//! broadcast.
//!
//! Each accepted TCP stream is upgraded to a WebSocket, registered in the
//! [`ConnectionRegistry`], and served by its own task. Within a connection
//! frames are handled strictly one at a time: the reply to a request is sent
//! before the next frame is read. Connections never wait on each other.

mod broadcast;
mod handlers;
mod registry;
mod router;

pub use broadcast::broadcast;
pub use handlers::{default_router, pong};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbound};
pub use router::{DispatchError, HandlerError, HandlerResult, Router};

use crate::{MessageEnvelope, DEFAULT_HANDSHAKE_TIMEOUT};
use futures::future::join_all;
use futures::StreamExt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

/// Server-level failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// Binding or accepting on the listening socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket handshake or frame I/O failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// An outbound envelope could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The daemon's message server.
///
/// Owns the connection registry and the router. Cloning yields another
/// handle to the same server, which is how the accept loop hands state to
/// per-connection tasks.
///
/// # Example
///
/// ```rust,no_run
/// use envscan_daemon::{default_router, EnvScanner, ScanOptions, Server};
/// use tokio::net::TcpListener;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), envscan_daemon::ServerError> {
///     let scanner = EnvScanner::system(&ScanOptions::default());
///     let server = Server::new(default_router(scanner));
///     let listener = TcpListener::bind("localhost:9721").await?;
///     server.serve(listener, std::future::pending()).await
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Server {
    registry: ConnectionRegistry,
    router: Arc<Router>,
    handshake_timeout: Duration,
}

impl Server {
    /// Server dispatching with `router` and an empty registry.
    pub fn new(router: Router) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            router: Arc::new(router),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Drop clients that have not completed the WebSocket handshake within
    /// `timeout` of connecting.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Live connections.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Push `envelope` to every connected client. See [`broadcast()`].
    pub async fn broadcast(&self, envelope: &MessageEnvelope) -> usize {
        broadcast(&self.registry, envelope).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Accept failures are logged and the loop continues; only the
    /// shutdown signal ends it. On shutdown every registered connection is
    /// sent a close frame, and each one leaves the registry once its peer
    /// completes the close handshake.
    pub async fn serve<S>(&self, listener: TcpListener, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "server_started");
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(connections = self.registry.len(), "server_shutdown");
                    self.close_all().await;
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = self.clone();
                        tokio::spawn(async move {
                            server.handle_connection(stream, remote_addr).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "accept_failed"),
                },
            }
        }
    }

    async fn close_all(&self) {
        let connections = self.registry.snapshot();
        join_all(connections.iter().map(|conn| async move {
            if let Err(e) = conn.close().await {
                debug!(id = %conn.id(), error = %e, "close_failed");
            }
        }))
        .await;
    }

    async fn handle_connection(&self, stream: TcpStream, remote_addr: SocketAddr) {
        let handshake = tokio_tungstenite::accept_async(stream);
        let ws = match tokio::time::timeout(self.handshake_timeout, handshake).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                debug!(client = %remote_addr, error = %e, "handshake_failed");
                return;
            }
            Err(_) => {
                debug!(
                    client = %remote_addr,
                    timeout = ?self.handshake_timeout,
                    "handshake_timed_out"
                );
                return;
            }
        };

        let (sink, mut frames) = ws.split();
        let conn = self.registry.add(remote_addr, Box::pin(sink));
        info!(client = %remote_addr, id = %conn.id(), "client_connected");

        while let Some(frame) = frames.next().await {
            let reply = match frame {
                Ok(Message::Text(text)) => self.router.respond(text.as_str()).await,
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.router.respond(text).await,
                    Err(_) => DispatchError::InvalidJson.into_envelope(),
                },
                // ping, pong and close are answered by the protocol layer;
                // after a close handshake the stream simply ends
                Ok(_) => continue,
                Err(e) => {
                    debug!(client = %remote_addr, error = %e, "read_failed");
                    break;
                }
            };

            if let Err(e) = conn.send(&reply).await {
                debug!(client = %remote_addr, error = %e, "send_failed");
                break;
            }
        }

        self.registry.remove(conn.id());
        info!(client = %remote_addr, id = %conn.id(), "client_disconnected");
    }
}
