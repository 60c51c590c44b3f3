//! Message routing: envelope decoding and handler dispatch.

use crate::{MessageEnvelope, Payload};
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Fault raised by a message handler.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// The handler failed with a message for the client.
    #[error("{0}")]
    Failed(String),

    /// The handler's response could not be encoded.
    #[error("failed to encode response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Why an inbound frame did not produce a handler response.
///
/// Every variant is rendered to an `error` envelope by
/// [`into_envelope`](Self::into_envelope); none of them closes the
/// connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The frame is not a `{type, payload}` JSON object.
    #[error("Invalid JSON")]
    InvalidJson,

    /// No handler is registered for the type.
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// The handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    /// `{"type":"error","payload":{"message":<self>}}`
    pub fn into_envelope(self) -> MessageEnvelope {
        MessageEnvelope::error(self.to_string())
    }
}

/// Result of one handler invocation.
pub type HandlerResult = Result<MessageEnvelope, HandlerError>;

type BoxedHandler = Arc<dyn Fn(Payload) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Maps message types to handlers.
///
/// # Example
///
/// ```rust
/// use envscan_daemon::{MessageEnvelope, Router};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let router = Router::new().route("echo", |payload| async move {
///     Ok(MessageEnvelope::new("echoed", payload))
/// });
///
/// let reply = router.dispatch(r#"{"type":"echo","payload":{"x":1}}"#).await.unwrap();
/// assert_eq!(reply.kind, "echoed");
///
/// let err = router.dispatch("{not json").await.unwrap_err();
/// assert_eq!(err.to_string(), "Invalid JSON");
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Router {
    handlers: HashMap<String, BoxedHandler>,
}

impl Router {
    /// Router with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous handler.
    pub fn route<F, Fut>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let boxed: BoxedHandler = Arc::new(move |payload: Payload| handler(payload).boxed());
        self.handlers.insert(kind.into(), boxed);
        self
    }

    /// Whether a handler is registered for `kind`.
    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Decode one text frame and run its handler.
    ///
    /// Handler errors and panics are caught here and returned as
    /// [`DispatchError::Handler`]; they never propagate to the connection.
    pub async fn dispatch(&self, raw: &str) -> Result<MessageEnvelope, DispatchError> {
        let envelope = match MessageEnvelope::from_json(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(body = raw, error = %e, "invalid_json");
                return Err(DispatchError::InvalidJson);
            }
        };

        info!(msg_type = %envelope.kind, payload = ?envelope.payload, "message_received");

        let Some(handler) = self.handlers.get(&envelope.kind) else {
            warn!(msg_type = %envelope.kind, "unknown_message_type");
            return Err(DispatchError::UnknownType(envelope.kind));
        };

        let outcome = AssertUnwindSafe(handler(envelope.payload))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(panic.as_ref()))));

        outcome.map_err(|e| {
            error!(msg_type = %envelope.kind, error = %e, "message_handling_error");
            DispatchError::from(e)
        })
    }

    /// Dispatch and render the outcome as the reply envelope.
    pub async fn respond(&self, raw: &str) -> MessageEnvelope {
        self.dispatch(raw)
            .await
            .unwrap_or_else(DispatchError::into_envelope)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Router").field("handlers", &kinds).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
