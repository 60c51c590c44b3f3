//! Tool detection and environment scanning.

use crate::detection::{first_line, probe, ProcessRunner, SystemRunner};
use crate::{GitConfig, ScanOptions, ScanReport, ToolInfo, ToolKind};
use futures::future::{join, join_all};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Detect a single tool.
///
/// Tries each of the tool's candidate commands in order and stops at the
/// first one that produces output.
///
/// # Detection Process
///
/// 1. Resolve the candidate executable through the runner
/// 2. Run it with its version arguments, bounded by the runner's timeout
/// 3. Take the trimmed stdout, or stderr when stdout is empty
/// 4. Keep only the first line of that banner
///
/// # Arguments
///
/// * `runner` - Process capability used for every invocation
/// * `kind` - The tool to detect
///
/// # Returns
///
/// A [`ToolInfo`] named after [`ToolKind::display_name`]:
/// - `found` with `version_found` set to the banner's first line
/// - `missing` with `version_found` unset when no candidate responds;
///   spawn failures, non-zero exits and timeouts all count as no response
///
/// # Example
///
/// ```rust,no_run
/// use envscan_daemon::{detect, SystemRunner, ToolKind};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let info = detect(&SystemRunner::default(), ToolKind::Python).await;
///     println!("{}: {:?}", info.name, info.version_found);
/// }
/// ```
pub async fn detect<R>(runner: &R, kind: ToolKind) -> ToolInfo
where
    R: ProcessRunner + ?Sized,
{
    for candidate in kind.candidates() {
        if let Some(banner) = probe(runner, candidate.program, candidate.args).await {
            let info = ToolInfo::found(kind, first_line(&banner));
            debug!(
                tool = kind.display_name(),
                command = candidate.program,
                version = ?info.parsed_version(),
                "tool_found"
            );
            return info;
        }
    }

    debug!(tool = kind.display_name(), "tool_missing");
    ToolInfo::missing(kind)
}

/// Read the local Git identity (`user.name` and `user.email`).
///
/// The two lookups run concurrently and independently; an unset value (or
/// a missing `git`) is reported as `None`.
pub async fn detect_git_identity<R>(runner: &R) -> GitConfig
where
    R: ProcessRunner + ?Sized,
{
    let (name, email) = join(
        probe(runner, "git", &["config", "user.name"]),
        probe(runner, "git", &["config", "user.email"]),
    )
    .await;

    GitConfig { name, email }
}

/// Scan the whole development environment.
///
/// All [`ToolKind`] detectors and the Git identity check run concurrently;
/// the scan waits for every one of them, so the slowest tool bounds the
/// total time. `tools` is assembled in registration order regardless of
/// which detector finished first, and `clock` is read once, after the join,
/// to stamp `scanned_at`.
///
/// # Example
///
/// ```rust,no_run
/// use envscan_daemon::{scan_environment, SystemRunner};
/// use std::time::SystemTime;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let report = scan_environment(&SystemRunner::default(), SystemTime::now).await;
///     for tool in &report.tools {
///         println!("{}: {:?}", tool.name, tool.status);
///     }
/// }
/// ```
pub async fn scan_environment<R, C>(runner: &R, clock: C) -> ScanReport
where
    R: ProcessRunner + ?Sized,
    C: FnOnce() -> SystemTime,
{
    let detectors = ToolKind::all().map(|kind| detect(runner, kind));
    let (tools, git_config) = join(join_all(detectors), detect_git_identity(runner)).await;

    ScanReport {
        tools,
        git_config,
        scanned_at: clock(),
    }
}

/// Shared handle for running scans with a fixed runner.
///
/// Cheap to clone; clones share the same runner.
#[derive(Clone)]
pub struct EnvScanner {
    runner: Arc<dyn ProcessRunner>,
}

impl EnvScanner {
    /// Scanner backed by an arbitrary runner.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Scanner that spawns real processes.
    pub fn system(options: &ScanOptions) -> Self {
        Self::new(Arc::new(SystemRunner::new(options)))
    }

    /// Run one scan, stamped with the current wall-clock time.
    pub async fn scan(&self) -> ScanReport {
        let report = scan_environment(self.runner.as_ref(), SystemTime::now).await;
        info!(
            found = report.found_count(),
            total = report.tools.len(),
            "scan_complete"
        );
        report
    }
}

impl std::fmt::Debug for EnvScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvScanner").finish_non_exhaustive()
    }
}
