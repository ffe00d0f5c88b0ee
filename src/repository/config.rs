//! Repository connection settings.

use secrecy::SecretString;
use std::time::Duration;

/// Connection settings for a remote sample repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// API root, e.g. `https://mwdb.example.org/api/`.
    pub base_url: String,

    /// API key (kept secret), sent as a bearer token.
    pub api_key: SecretString,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl RepositoryConfig {
    /// Creates a new configuration for `base_url` authenticated with `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into().into()),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_api_key_is_redacted() {
        let config = RepositoryConfig::new("https://mwdb.example/api/", "s3cr3t-key");
        assert_eq!(config.api_key.expose_secret(), "s3cr3t-key");
        assert!(!format!("{config:?}").contains("s3cr3t-key"));
    }
}
