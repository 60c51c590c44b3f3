//! Built-in message handlers.
//!
//! | request        | response              |
//! |----------------|-----------------------|
//! | `ping`         | `pong`                |
//! | `scan_env`     | `scan_env_result`     |
//! | `start_agent`  | `agent_started`       |
//! | `stop_agent`   | `agent_stopped`       |
//! | `agent_status` | `agent_status_result` |
//! | `chat_message` | `chat_response`       |
//!
//! The four agent messages are placeholders that answer
//! `{"status":"not_implemented"}`.

use super::router::{HandlerError, HandlerResult, Router};
use crate::{EnvScanner, MessageEnvelope, Payload};
use serde_json::Value;

const AGENT_PLACEHOLDERS: &[(&str, &str)] = &[
    ("start_agent", "agent_started"),
    ("stop_agent", "agent_stopped"),
    ("agent_status", "agent_status_result"),
    ("chat_message", "chat_response"),
];

/// Router with every built-in handler registered.
pub fn default_router(scanner: EnvScanner) -> Router {
    let router = Router::new()
        .route("ping", |payload| async move { Ok(pong(&payload)) })
        .route("scan_env", move |_| {
            let scanner = scanner.clone();
            async move { scan_env(&scanner).await }
        });

    AGENT_PLACEHOLDERS
        .iter()
        .fold(router, |router, &(request, response)| {
            router.route(request, move |_| async move { Ok(not_implemented(response)) })
        })
}

/// `pong` echoing `payload.timestamp` unchanged (`null` when absent).
pub fn pong(payload: &Payload) -> MessageEnvelope {
    let timestamp = payload.get("timestamp").cloned().unwrap_or(Value::Null);
    MessageEnvelope::with_field("pong", "timestamp", timestamp)
}

async fn scan_env(scanner: &EnvScanner) -> HandlerResult {
    let report = scanner.scan().await;
    match serde_json::to_value(report)? {
        Value::Object(payload) => Ok(MessageEnvelope::new("scan_env_result", payload)),
        other => Err(HandlerError::Failed(format!(
            "scan report encoded as {other}, expected an object"
        ))),
    }
}

fn not_implemented(response: &str) -> MessageEnvelope {
    MessageEnvelope::with_field(response, "status", "not_implemented")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fake::FakeRunner;
    use crate::ToolKind;
    use serde_json::json;
    use std::sync::Arc;

    fn router() -> Router {
        let runner = FakeRunner::new()
            .stdout("node --version", "v20.11.0\n")
            .stdout("git config user.email", "ada@example.com\n");
        default_router(EnvScanner::new(Arc::new(runner)))
    }

    #[tokio::test]
    async fn test_ping_echoes_any_timestamp() {
        let router = router();
        for ts in [
            json!(1_700_000_000_123u64),
            json!(-1.5),
            json!("2024-01-01T00:00:00Z"),
            json!({"nested": [1, null]}),
            json!(null),
            serde_json::from_str("123456789012345678901234567890").unwrap(),
        ] {
            let raw = json!({"type": "ping", "payload": {"timestamp": ts}}).to_string();
            let reply = router.respond(&raw).await;
            assert_eq!(
                serde_json::to_value(reply).unwrap(),
                json!({"type": "pong", "payload": {"timestamp": ts}})
            );
        }
    }

    #[tokio::test]
    async fn test_ping_keeps_wide_numbers_verbatim() {
        let router = router();
        for ts in [
            "123456789012345678901234567890",
            "-98765432109876543210",
            "0.1000000000000000055511151231257827",
        ] {
            let raw = format!(r#"{{"type":"ping","payload":{{"timestamp":{ts}}}}}"#);
            let reply = router.respond(&raw).await.to_json().unwrap();
            assert_eq!(reply, format!(r#"{{"type":"pong","payload":{{"timestamp":{ts}}}}}"#));
        }
    }

    #[tokio::test]
    async fn test_ping_without_timestamp() {
        let reply = router().respond(r#"{"type":"ping"}"#).await;
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({"type": "pong", "payload": {"timestamp": null}})
        );
    }

    #[tokio::test]
    async fn test_scan_env_returns_report() {
        let reply = router().respond(r#"{"type":"scan_env"}"#).await;
        assert_eq!(reply.kind, "scan_env_result");

        let tools = reply.payload["tools"].as_array().unwrap();
        assert_eq!(tools.len(), ToolKind::COUNT);
        assert_eq!(tools[0]["name"], "Node.js");
        assert_eq!(tools[0]["status"], "found");
        assert_eq!(tools[0]["version_found"], "v20.11.0");
        assert_eq!(tools[1]["status"], "missing");
        assert_eq!(
            reply.payload["git_config"],
            json!({"name": null, "email": "ada@example.com"})
        );
        assert!(reply.payload["scanned_at"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_agent_placeholders() {
        let router = router();
        for (request, response) in AGENT_PLACEHOLDERS {
            let raw = json!({"type": request, "payload": {"agent": "x"}}).to_string();
            let reply = router.respond(&raw).await;
            assert_eq!(
                serde_json::to_value(reply).unwrap(),
                json!({"type": response, "payload": {"status": "not_implemented"}})
            );
        }
    }

    #[test]
    fn test_catalog_is_registered() {
        let router = router();
        for kind in ["ping", "scan_env", "start_agent", "stop_agent", "agent_status", "chat_message"] {
            assert!(router.handles(kind), "{kind} not registered");
        }
        assert!(!router.handles("frobnicate"));
    }
}
