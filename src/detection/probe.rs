//! Command probe: one invocation interpreted as an optional version banner.

use super::ProcessRunner;
use std::io;
use tracing::{debug, warn};

/// Run one candidate command and return its trimmed output.
///
/// # Arguments
///
/// * `runner` - Process capability that performs the invocation
/// * `command` - Executable name, resolved by the runner
/// * `args` - Arguments such as `--version`
///
/// # Returns
///
/// On exit code 0, the trimmed stdout, or the trimmed stderr when stdout
/// is empty (`java -version` writes its banner to stderr). Every other
/// outcome, including an empty banner, is `None`:
///
/// - non-zero exit
/// - executable not found or not executable (logged at debug)
/// - timeout or any other spawn failure (logged at warn)
///
/// Never fails; a missing tool is a normal result, not an error.
pub(crate) async fn probe<R>(runner: &R, command: &str, args: &[&str]) -> Option<String>
where
    R: ProcessRunner + ?Sized,
{
    let output = match runner.invoke(command, args).await {
        Ok(output) => output,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
            debug!(command, error = %e, "probe_unavailable");
            return None;
        }
        Err(e) => {
            warn!(command, ?args, error = %e, "probe_failed");
            return None;
        }
    };

    if !output.success() {
        debug!(command, exit_code = ?output.exit_code, "probe_nonzero_exit");
        return None;
    }

    let stdout = output.stdout.trim();
    let text = if stdout.is_empty() {
        output.stderr.trim()
    } else {
        stdout
    };

    (!text.is_empty()).then(|| text.to_string())
}

/// First line of a banner, trimmed.
pub(crate) fn first_line(banner: &str) -> &str {
    banner.lines().next().unwrap_or_default().trim()
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::{ProcessOutput, ProcessRunner};
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    /// Canned runner keyed by the full command line (`"node --version"`).
    /// Unknown command lines behave like a missing executable.
    #[derive(Default)]
    pub(crate) struct FakeRunner {
        responses: HashMap<String, io::Result<ProcessOutput>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn stdout(mut self, line: &str, stdout: &str) -> Self {
            self.responses.insert(
                line.to_string(),
                Ok(ProcessOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                }),
            );
            self
        }

        pub(crate) fn output(mut self, line: &str, output: ProcessOutput) -> Self {
            self.responses.insert(line.to_string(), Ok(output));
            self
        }

        pub(crate) fn error(mut self, line: &str, kind: io::ErrorKind) -> Self {
            self.responses
                .insert(line.to_string(), Err(io::Error::new(kind, "fake failure")));
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn invoke<'a>(
            &'a self,
            command: &'a str,
            args: &'a [&'a str],
        ) -> BoxFuture<'a, io::Result<ProcessOutput>> {
            let line = std::iter::once(command)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(line.clone());
            let result = match self.responses.get(&line) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(e)) => Err(io::Error::new(e.kind(), e.to_string())),
                None => Err(io::Error::new(io::ErrorKind::NotFound, line)),
            };
            Box::pin(async move { result })
        }
    }
}
