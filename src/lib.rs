//! # envscan-daemon
//!
//! Local orchestration daemon for editor and agent front-ends.
//!
//! The daemon exposes a WebSocket message channel and, on request, inspects
//! the host's installed developer toolchains (language runtimes, package
//! managers, VCS, containers).
//!
//! ## Features
//!
//! - `ToolKind` enum listing the detected tools in a fixed order
//! - `detect()` checks one tool; `scan_environment()` checks all of them
//!   concurrently and returns a `ScanReport`
//! - `ProcessRunner` trait so detection can run against a fake host
//! - `Server` with a `ConnectionRegistry`, a `Router` for `{type, payload}`
//!   envelopes, and `broadcast()` to push messages to every client
//!
//! ## Example
//!
//! ```rust,no_run
//! use envscan_daemon::{scan_environment, SystemRunner, ToolStatus};
//! use std::time::SystemTime;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let report = scan_environment(&SystemRunner::default(), SystemTime::now).await;
//!     for tool in &report.tools {
//!         match tool.status {
//!             ToolStatus::Found => println!("{}: {}", tool.name, tool.version_found.as_deref().unwrap_or("")),
//!             _ => println!("{}: missing", tool.name),
//!         }
//!     }
//! }
//! ```

mod detection;
mod envelope;
mod options;
mod scan;
mod server;
mod tool_info;
mod tool_kind;

pub use detection::{ProcessOutput, ProcessRunner, SystemRunner};
pub use envelope::{MessageEnvelope, Payload};
pub use options::{
    ScanOptions, ServerOptions, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_PROBE_TIMEOUT,
};
pub use scan::{detect, detect_git_identity, scan_environment, EnvScanner};
pub use server::{
    broadcast, default_router, pong, ConnectionHandle, ConnectionId, ConnectionRegistry,
    DispatchError, HandlerError, HandlerResult, Outbound, Router, Server, ServerError,
};
pub use tool_info::{GitConfig, ScanReport, ToolInfo, ToolStatus};
pub use tool_kind::{ProbeCommand, ToolKind};
