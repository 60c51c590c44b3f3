//! Daemon configuration.
//!
//! This module provides [`ScanOptions`] for the probing engine and
//! [`ServerOptions`] for the WebSocket listener. Both have sensible
//! defaults and are normally filled in from the command line.

use std::time::Duration;

/// Default listen host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9721;

/// Default upper bound on a single probe invocation.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default upper bound on the WebSocket opening handshake of one client.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration options for environment scanning.
///
/// # Example
///
/// ```rust
/// use envscan_daemon::ScanOptions;
/// use std::time::Duration;
///
/// // Default: 5 second probe timeout
/// let opts = ScanOptions::default();
///
/// // Slow network home directories may need more
/// let opts = ScanOptions {
///     probe_timeout: Duration::from_secs(20),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum time to wait for one candidate command to exit.
    ///
    /// A command still running when this expires is killed and treated as
    /// producing no result. A tool with two candidates can therefore cost
    /// up to twice this value.
    ///
    /// Default: 5 seconds
    pub probe_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Where the WebSocket server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Host name or address to bind.
    ///
    /// Default: `localhost`
    pub host: String,

    /// TCP port to bind; `0` picks an ephemeral port.
    ///
    /// Default: 9721
    pub port: u16,
}

impl ServerOptions {
    /// `host:port`, suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
