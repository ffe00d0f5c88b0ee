//! Environment-driven configuration.
//!
//! Every setting is read from a `SCANHOOK_`-prefixed variable and is
//! optional. Loading goes through a lookup function so callers (and tests)
//! can supply values without touching the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `SCANHOOK_REPOSITORY_URL` | none |
//! | `SCANHOOK_REPOSITORY_API_KEY` | none |
//! | `SCANHOOK_CLAMAV_ENABLED` | `true` |
//! | `SCANHOOK_YARA_ENABLED` | `true` |
//! | `SCANHOOK_YARA_RULES_PATH` | `/opt/yara/rules.yar` |
//! | `SCANHOOK_MAX_FILE_SIZE` | `52428800` |
//! | `SCANHOOK_CLAMAV_TIMEOUT_SECS` | `20` |
//! | `SCANHOOK_YARA_TIMEOUT_SECS` | `60` |
//! | `SCANHOOK_CLAMD_SOCKET` | none |
//! | `SCANHOOK_CLAMDSCAN_BIN` | `clamdscan` |
//! | `SCANHOOK_YARA_BIN` | `yara` |
//! | `SCANHOOK_SANDBOX_DIR` | `<temp dir>/scanhook` |

use crate::backends::yara::DEFAULT_RULES_PATH;
use crate::backends::{ClamAvConfig, YaraConfig};
use crate::core::{EngineKind, ScanError};
use crate::manager::DEFAULT_MAX_FILE_SIZE;
use crate::repository::RepositoryConfig;

use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix shared by every variable.
pub const ENV_PREFIX: &str = "SCANHOOK_";

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct ScanHookConfig {
    /// Repository API root.
    pub repository_url: Option<String>,

    /// Repository API key (kept secret).
    pub repository_api_key: Option<SecretString>,

    /// Whether the ClamAV driver runs.
    pub clamav_enabled: bool,

    /// Whether the YARA driver runs.
    pub yara_enabled: bool,

    /// Rules file passed to YARA.
    pub yara_rules_path: PathBuf,

    /// Size ceiling in bytes.
    pub max_file_size: u64,

    /// ClamAV scan timeout.
    pub clamav_timeout: Duration,

    /// YARA scan timeout.
    pub yara_timeout: Duration,

    /// clamd socket override.
    pub clamd_socket: Option<PathBuf>,

    /// clamdscan executable.
    pub clamdscan_bin: String,

    /// yara executable.
    pub yara_bin: String,

    /// Sandbox directory for staged files.
    pub sandbox_dir: PathBuf,
}

impl Default for ScanHookConfig {
    fn default() -> Self {
        let clamav = ClamAvConfig::default();
        let yara = YaraConfig::default();
        Self {
            repository_url: None,
            repository_api_key: None,
            clamav_enabled: true,
            yara_enabled: true,
            yara_rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            clamav_timeout: clamav.scan_timeout,
            yara_timeout: yara.scan_timeout,
            clamd_socket: None,
            clamdscan_bin: clamav.program,
            yara_bin: yara.program,
            sandbox_dir: std::env::temp_dir().join("scanhook"),
        }
    }
}

impl ScanHookConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which is called with the
    /// full variable name and returns its value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let mut config = Self::default();

        config.repository_url = vars.string("REPOSITORY_URL");
        config.repository_api_key = vars
            .string("REPOSITORY_API_KEY")
            .map(|key| SecretString::new(key.into()));

        if let Some(enabled) = vars.bool("CLAMAV_ENABLED")? {
            config.clamav_enabled = enabled;
        }
        if let Some(enabled) = vars.bool("YARA_ENABLED")? {
            config.yara_enabled = enabled;
        }
        if let Some(path) = vars.string("YARA_RULES_PATH") {
            config.yara_rules_path = PathBuf::from(path);
        }
        if let Some(size) = vars.positive("MAX_FILE_SIZE")? {
            config.max_file_size = size;
        }
        if let Some(secs) = vars.positive("CLAMAV_TIMEOUT_SECS")? {
            config.clamav_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = vars.positive("YARA_TIMEOUT_SECS")? {
            config.yara_timeout = Duration::from_secs(secs);
        }
        config.clamd_socket = vars.string("CLAMD_SOCKET").map(PathBuf::from);
        if let Some(bin) = vars.string("CLAMDSCAN_BIN") {
            config.clamdscan_bin = bin;
        }
        if let Some(bin) = vars.string("YARA_BIN") {
            config.yara_bin = bin;
        }
        if let Some(dir) = vars.string("SANDBOX_DIR") {
            config.sandbox_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Engines to run, in scan order.
    pub fn enabled_engines(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|engine| match engine {
                EngineKind::ClamAv => self.clamav_enabled,
                EngineKind::Yara => self.yara_enabled,
            })
            .collect()
    }

    /// ClamAV driver settings.
    pub fn clamav_config(&self) -> ClamAvConfig {
        let mut config = ClamAvConfig::new()
            .with_program(self.clamdscan_bin.clone(), Vec::<String>::new())
            .with_scan_timeout(self.clamav_timeout);
        if let Some(ref socket) = self.clamd_socket {
            config = config.with_socket(socket);
        }
        config
    }

    /// YARA driver settings.
    pub fn yara_config(&self) -> YaraConfig {
        YaraConfig::new()
            .with_program(self.yara_bin.clone(), Vec::<String>::new())
            .with_rules_path(&self.yara_rules_path)
            .with_scan_timeout(self.yara_timeout)
    }

    /// Repository client settings.
    ///
    /// Fails if the endpoint or the credential is missing.
    pub fn repository_config(&self) -> Result<RepositoryConfig, ScanError> {
        let url = self.repository_url.as_deref().ok_or_else(|| {
            ScanError::configuration(format!("{}REPOSITORY_URL is not set", ENV_PREFIX))
        })?;
        let key = self.repository_api_key.as_ref().ok_or_else(|| {
            ScanError::configuration(format!("{}REPOSITORY_API_KEY is not set", ENV_PREFIX))
        })?;

        Ok(RepositoryConfig::new(url, key.expose_secret()))
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-blank trimmed value of `SCANHOOK_{name}`.
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Result<Option<bool>, ScanError> {
        let Some(value) = self.string(name) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ScanError::configuration(format!(
                "{}{} must be a boolean, got '{}'",
                ENV_PREFIX, name, value
            ))),
        }
    }

    fn positive(&self, name: &str) -> Result<Option<u64>, ScanError> {
        let Some(value) = self.string(name) else {
            return Ok(None);
        };
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ScanError::configuration(format!(
                "{}{} must be a positive integer, got '{}'",
                ENV_PREFIX, name, value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ScanHookConfig, ScanError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        ScanHookConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.clamav_enabled);
        assert!(config.yara_enabled);
        assert_eq!(config.yara_rules_path, PathBuf::from("/opt/yara/rules.yar"));
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.clamav_timeout, Duration::from_secs(20));
        assert_eq!(config.yara_timeout, Duration::from_secs(60));
        assert_eq!(config.clamdscan_bin, "clamdscan");
        assert_eq!(config.yara_bin, "yara");
        assert!(config.sandbox_dir.ends_with("scanhook"));
        assert_eq!(
            config.enabled_engines(),
            vec![EngineKind::ClamAv, EngineKind::Yara]
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CLAMAV_ENABLED", "off"),
            ("YARA_ENABLED", "YES"),
            ("YARA_RULES_PATH", "/etc/yara/all.yar"),
            ("MAX_FILE_SIZE", "1024"),
            ("YARA_TIMEOUT_SECS", "5"),
            ("CLAMD_SOCKET", "/run/clamd.ctl"),
            ("SANDBOX_DIR", "/var/tmp/scan"),
        ])
        .unwrap();

        assert_eq!(config.enabled_engines(), vec![EngineKind::Yara]);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.sandbox_dir, PathBuf::from("/var/tmp/scan"));

        let yara = config.yara_config();
        assert_eq!(yara.rules_path, PathBuf::from("/etc/yara/all.yar"));
        assert_eq!(yara.scan_timeout, Duration::from_secs(5));

        let clamav = config.clamav_config();
        assert_eq!(clamav.socket_path, Some(PathBuf::from("/run/clamd.ctl")));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("CLAMAV_ENABLED", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SCANHOOK_CLAMAV_ENABLED"));

        for bad in ["0", "-5", "lots"] {
            let err = load(&[("MAX_FILE_SIZE", bad)]).unwrap_err();
            assert!(matches!(err, ScanError::Configuration { .. }));
            assert!(err.to_string().contains("SCANHOOK_MAX_FILE_SIZE"));
        }
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("YARA_BIN", "  "), ("CLAMAV_ENABLED", "")]).unwrap();
        assert_eq!(config.yara_bin, "yara");
        assert!(config.clamav_enabled);
    }

    #[test]
    fn test_repository_config_requires_url_and_key() {
        let config = load(&[("REPOSITORY_URL", "https://mwdb.example/api/")]).unwrap();
        let err = config.repository_config().unwrap_err();
        assert!(err.to_string().contains("REPOSITORY_API_KEY"));

        let config = load(&[
            ("REPOSITORY_URL", "https://mwdb.example/api/"),
            ("REPOSITORY_API_KEY", "token"),
        ])
        .unwrap();
        let repo = config.repository_config().unwrap();
        assert_eq!(repo.base_url, "https://mwdb.example/api/");
        assert_eq!(repo.api_key.expose_secret(), "token");
        assert!(!format!("{config:?}").contains("token"));
    }
}
