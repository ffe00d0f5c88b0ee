//! YARA scanning backend.
//!
//! Runs the `yara` command line scanner against a compiled or source rules
//! file: `yara <rules> <path>`. Each line of output names one matching rule.
//! The scanner starts cold on every invocation, so its timeout is longer
//! than the antivirus daemon's.

use crate::backends::process::run_command;
use crate::core::{EngineKind, EngineOutcome, EngineResult, ScanError, Scanner, Verdict};
use crate::sandbox::PathGuard;
use crate::verdict::rules::parse_rule_output;

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default location of the rules file.
pub const DEFAULT_RULES_PATH: &str = "/opt/yara/rules.yar";

/// YARA scanner configuration.
#[derive(Debug, Clone)]
pub struct YaraConfig {
    /// Executable to launch.
    pub program: String,

    /// Arguments placed before the rules path, for wrappers.
    pub leading_args: Vec<String>,

    /// Rules file passed to every scan.
    pub rules_path: PathBuf,

    /// Scan timeout.
    pub scan_timeout: Duration,
}

impl Default for YaraConfig {
    fn default() -> Self {
        Self {
            program: "yara".to_string(),
            leading_args: Vec::new(),
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            scan_timeout: Duration::from_secs(60),
        }
    }
}

impl YaraConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executable and any arguments that precede the rules path.
    pub fn with_program<I, S>(mut self, program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the rules file.
    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = path.into();
        self
    }

    /// Sets the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    fn scan_args(&self, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push(self.rules_path.as_os_str().to_owned());
        args.push(target.into());
        args
    }
}

/// YARA scanner implementation.
#[derive(Debug)]
pub struct YaraScanner {
    config: YaraConfig,
    guard: PathGuard,
}

impl YaraScanner {
    /// Creates a new YARA scanner confined by `guard`.
    pub fn new(config: YaraConfig, guard: PathGuard) -> Self {
        Self { config, guard }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &YaraConfig {
        &self.config
    }

    async fn scan_path(&self, path: &Path) -> Result<Vec<Verdict>, ScanError> {
        let target = self.guard.validate(path)?;

        let output = run_command(
            EngineKind::Yara,
            &self.config.program,
            &self.config.scan_args(&target),
            self.config.scan_timeout,
        )
        .await?;

        parse_rule_output(
            EngineKind::Yara,
            output.exit_code,
            &output.stdout,
            &output.stderr,
        )
    }
}

#[async_trait]
impl Scanner for YaraScanner {
    fn engine(&self) -> EngineKind {
        EngineKind::Yara
    }

    async fn scan(&self, path: &Path) -> EngineResult {
        let start = Instant::now();

        match self.scan_path(path).await {
            Ok(verdicts) => {
                tracing::debug!(
                    engine = "yara",
                    matches = verdicts.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "YARA scan finished"
                );
                EngineResult {
                    engine: EngineKind::Yara,
                    outcome: EngineOutcome::Matches { verdicts },
                    version: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    engine = "yara",
                    path = %path.display(),
                    rules = %self.config.rules_path.display(),
                    error = %e,
                    "YARA scan failed"
                );
                EngineResult::failed(EngineKind::Yara, e.to_string())
            }
        }
    }
}
