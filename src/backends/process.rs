//! Bounded execution of external scanner processes.

use crate::core::{EngineKind, ScanError};

use std::ffi::OsString;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Captured result of a finished scanner process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Wall-clock time the process ran.
    pub elapsed: Duration,
}

/// Runs `program` with `args`, waiting at most `timeout`.
///
/// The child is spawned with `kill_on_drop`, so when the timeout expires
/// the pending wait is dropped and the process is killed.
///
/// # Errors
///
/// - `EngineUnavailable` if the program cannot be launched
/// - `Timeout` if it does not exit in time
/// - `Process` if its output cannot be collected
pub async fn run_command(
    engine: EngineKind,
    program: &str,
    args: &[OsString],
    timeout: Duration,
) -> Result<ProcessOutput, ScanError> {
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::engine_unavailable(
                    engine.as_str(),
                    format!("'{}' not found in PATH", program),
                )
            } else {
                ScanError::engine_unavailable(
                    engine.as_str(),
                    format!("failed to launch '{}': {}", program, e),
                )
            }
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ScanError::process(
                engine.as_str(),
                None,
                format!("failed to collect output: {}", e),
            ));
        }
        Err(_) => return Err(ScanError::timeout(engine.as_str(), timeout)),
    };

    let elapsed = start.elapsed();
    tracing::trace!(
        engine = %engine,
        program = %program,
        exit_code = ?output.status.code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Scanner process exited"
    );

    Ok(ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        elapsed,
    })
}
