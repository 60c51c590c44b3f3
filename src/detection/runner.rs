//! Process execution capability with timeout.

use super::path_finder::find_executable;
use crate::ScanOptions;
use futures::future::BoxFuture;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands on behalf of the detectors.
///
/// The scanner only ever talks to the host through this trait, so tests can
/// substitute a deterministic implementation that never spawns anything.
///
/// Implementations report "executable not found" as
/// [`io::ErrorKind::NotFound`] and a hung process as
/// [`io::ErrorKind::TimedOut`].
///
/// # Example
///
/// ```rust
/// use envscan_daemon::{ProcessOutput, ProcessRunner};
/// use futures::future::BoxFuture;
///
/// struct Canned;
///
/// impl ProcessRunner for Canned {
///     fn invoke<'a>(
///         &'a self,
///         command: &'a str,
///         _args: &'a [&'a str],
///     ) -> BoxFuture<'a, std::io::Result<ProcessOutput>> {
///         Box::pin(async move {
///             Ok(ProcessOutput {
///                 stdout: format!("{command} 1.0.0\n"),
///                 stderr: String::new(),
///                 exit_code: Some(0),
///             })
///         })
///     }
/// }
/// ```
pub trait ProcessRunner: Send + Sync {
    /// Run `command` with `args` to completion and capture its output.
    fn invoke<'a>(&'a self, command: &'a str, args: &'a [&'a str])
        -> BoxFuture<'a, io::Result<ProcessOutput>>;
}

/// [`ProcessRunner`] that spawns real child processes.
///
/// Every invocation is bounded by the configured timeout and the child is
/// killed if the timeout fires.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner from scan options.
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            timeout: options.probe_timeout,
        }
    }

    /// The per-invocation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, command: &str, args: &[&str]) -> io::Result<ProcessOutput> {
        let path = find_executable(command).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("executable not found: {command}"),
            )
        })?;

        let mut cmd = Command::new(&path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output()).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{command} did not exit within {:?}", self.timeout),
            )
        })??;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(&ScanOptions::default())
    }
}

impl ProcessRunner for SystemRunner {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, io::Result<ProcessOutput>> {
        Box::pin(self.run(command, args))
    }
}
