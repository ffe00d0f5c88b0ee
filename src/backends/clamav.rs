//! ClamAV scanning backend.
//!
//! This module drives ClamAV through the `clamdscan` client of the
//! clamd daemon.
//!
//! # Requirements
//!
//! - ClamAV daemon (clamd) must be running
//! - `clamdscan` must be on `PATH` (or configured explicitly)
//!
//! # Invocation
//!
//! `clamdscan --no-summary --fdpass [--unix-socket <socket>] <path>`.
//! Exit code `0` is clean, `1` is a detection, anything else an error.

use crate::backends::process::run_command;
use crate::core::{EngineKind, EngineResult, ScanError, Scanner, Verdict};
use crate::sandbox::PathGuard;
use crate::verdict::antivirus::{normalize_version, parse_antivirus_output, UNKNOWN_VERSION};

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// ClamAV scanner configuration.
#[derive(Debug, Clone)]
pub struct ClamAvConfig {
    /// Executable to launch.
    pub program: String,

    /// Arguments placed before the clamdscan flags, for wrappers.
    pub leading_args: Vec<String>,

    /// clamd Unix socket, if not the client's default.
    pub socket_path: Option<PathBuf>,

    /// Scan timeout. Daemon mode answers quickly, so this is short.
    pub scan_timeout: Duration,

    /// Timeout for the `--version` probe.
    pub version_timeout: Duration,
}

impl Default for ClamAvConfig {
    fn default() -> Self {
        Self {
            program: "clamdscan".to_string(),
            leading_args: Vec::new(),
            socket_path: None,
            scan_timeout: Duration::from_secs(20),
            version_timeout: Duration::from_secs(10),
        }
    }
}

impl ClamAvConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executable and any arguments that precede the clamdscan flags.
    pub fn with_program<I, S>(mut self, program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    /// Uses a specific clamd Unix socket.
    pub fn with_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Sets the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Sets the version probe timeout.
    pub fn with_version_timeout(mut self, timeout: Duration) -> Self {
        self.version_timeout = timeout;
        self
    }

    fn scan_args(&self, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push("--no-summary".into());
        args.push("--fdpass".into());
        if let Some(ref socket) = self.socket_path {
            args.push("--unix-socket".into());
            args.push(socket.into());
        }
        args.push(target.into());
        args
    }

    fn version_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push("--version".into());
        args
    }
}

/// ClamAV scanner implementation.
///
/// # Example
///
/// ```rust,ignore
/// use scanhook::backends::ClamAvScanner;
/// use scanhook::backends::clamav::ClamAvConfig;
///
/// let config = ClamAvConfig::new().with_socket("/var/run/clamav/clamd.ctl");
/// let scanner = ClamAvScanner::new(config, sandbox.guard().clone());
/// ```
#[derive(Debug)]
pub struct ClamAvScanner {
    config: ClamAvConfig,
    guard: PathGuard,
}

impl ClamAvScanner {
    /// Creates a new ClamAV scanner confined by `guard`.
    pub fn new(config: ClamAvConfig, guard: PathGuard) -> Self {
        Self { config, guard }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClamAvConfig {
        &self.config
    }

    async fn scan_path(&self, path: &Path) -> Result<Verdict, ScanError> {
        let target = self.guard.validate(path)?;

        let output = run_command(
            EngineKind::ClamAv,
            &self.config.program,
            &self.config.scan_args(&target),
            self.config.scan_timeout,
        )
        .await?;

        match parse_antivirus_output(output.exit_code, &output.stdout) {
            Verdict::Error => Err(ScanError::process(
                EngineKind::ClamAv.as_str(),
                output.exit_code,
                format!("{} {}", output.stderr.trim(), output.stdout.trim())
                    .trim()
                    .to_string(),
            )),
            verdict => Ok(verdict),
        }
    }
}

#[async_trait]
impl Scanner for ClamAvScanner {
    fn engine(&self) -> EngineKind {
        EngineKind::ClamAv
    }

    async fn scan(&self, path: &Path) -> EngineResult {
        let start = Instant::now();

        let verdict = match self.scan_path(path).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(
                    engine = "clamav",
                    path = %path.display(),
                    error = %e,
                    "ClamAV scan failed"
                );
                Verdict::Error
            }
        };

        tracing::debug!(
            engine = "clamav",
            verdict = %verdict,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ClamAV scan finished"
        );

        let version = self
            .version()
            .await
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

        EngineResult::single(EngineKind::ClamAv, verdict).with_version(version)
    }

    async fn version(&self) -> Option<String> {
        match run_command(
            EngineKind::ClamAv,
            &self.config.program,
            &self.config.version_args(),
            self.config.version_timeout,
        )
        .await
        {
            Ok(output) => Some(normalize_version(
                output.exit_code,
                &output.stdout,
                &output.stderr,
            )),
            Err(e) => {
                tracing::debug!(engine = "clamav", error = %e, "Version probe failed");
                None
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::EngineOutcome;
    use crate::sandbox::Sandbox;
    use tempfile::TempDir;

    /// A `sh` script standing in for clamdscan. `$1` is the first flag.
    fn fake_clamdscan(script: &str) -> ClamAvConfig {
        let script = format!(
            "case \"$1\" in --version) echo 'ClamAV 1.3.1/27342'; exit 0;; esac; {}",
            script
        );
        ClamAvConfig::new().with_program("sh", ["-c".to_string(), script, "clamdscan".to_string()])
    }

    fn verdict_of(result: &EngineResult) -> &Verdict {
        match &result.outcome {
            EngineOutcome::Single { verdict } => verdict,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    async fn scan_with(config: ClamAvConfig) -> EngineResult {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let staged = sandbox.stage_bytes("abc123", b"sample").await.unwrap();
        let scanner = ClamAvScanner::new(config, sandbox.guard().clone());
        scanner.scan(staged.path()).await
    }

    #[test]
    fn test_scan_args() {
        let config = ClamAvConfig::new().with_socket("/run/clamd.ctl");
        let args = config.scan_args(Path::new("/sandbox/f"));
        assert_eq!(
            args,
            vec![
                OsString::from("--no-summary"),
                "--fdpass".into(),
                "--unix-socket".into(),
                "/run/clamd.ctl".into(),
                "/sandbox/f".into(),
            ]
        );
    }

    #[tokio::test]
    async fn test_clean_scan() {
        let result = scan_with(fake_clamdscan("exit 0")).await;
        assert_eq!(verdict_of(&result), &Verdict::Clean);
        assert_eq!(result.version.as_deref(), Some("ClamAV 1.3.1/27342"));
    }

    #[tokio::test]
    async fn test_detection_names_signature() {
        let result = scan_with(fake_clamdscan(
            "for last; do :; done; echo \"$last: Win.Test.EICAR FOUND\"; exit 1",
        ))
        .await;
        assert_eq!(
            verdict_of(&result),
            &Verdict::Detected("Win.Test.EICAR".into())
        );
    }

    #[tokio::test]
    async fn test_error_exit_code() {
        let result = scan_with(fake_clamdscan("echo 'f: Access denied. ERROR'; exit 2")).await;
        assert_eq!(verdict_of(&result), &Verdict::Error);
    }

    #[tokio::test]
    async fn test_timeout_is_error() {
        let config = fake_clamdscan("sleep 10").with_scan_timeout(Duration::from_millis(200));
        let result = scan_with(config).await;
        assert_eq!(verdict_of(&result), &Verdict::Error);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let config = ClamAvConfig::new()
            .with_program("/nonexistent/clamdscan", Vec::<String>::new())
            .with_version_timeout(Duration::from_secs(1));
        let result = scan_with(config).await;
        assert_eq!(verdict_of(&result), &Verdict::Error);
        assert_eq!(result.version.as_deref(), Some(UNKNOWN_VERSION));
    }

    #[tokio::test]
    async fn test_escaping_path_never_launches_process() {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path().join("sandbox")).unwrap();
        let outside = dir.path().join("outside.bin");
        std::fs::write(&outside, b"sample").unwrap();
        let marker = dir.path().join("launched");

        let config = fake_clamdscan(&format!("touch '{}'; exit 0", marker.display()));
        let scanner = ClamAvScanner::new(config, sandbox.guard().clone());

        let result = scanner.scan(&outside).await;
        assert_eq!(verdict_of(&result), &Verdict::Error);

        let traversal = sandbox.root().join("../outside.bin");
        let result = scanner.scan(&traversal).await;
        assert_eq!(verdict_of(&result), &Verdict::Error);

        assert!(!marker.exists());
    }
}
