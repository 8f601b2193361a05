//! Configuration file handling for contactgate.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Contact form configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service identifier handed to the dispatch collaborator.
    pub service_id: String,
    /// Template identifier handed to the dispatch collaborator.
    pub template_id: String,
    /// Public key handed to the dispatch collaborator.
    pub public_key: String,
    /// Mailbox that receives the contact messages.
    pub to_email: String,
    /// Minimum milliseconds between render and submit.
    #[serde(default = "Config::default_min_dwell_ms")]
    pub min_dwell_ms: u64,
    /// Submissions allowed per window.
    #[serde(default = "Config::default_max_attempts")]
    pub max_attempts: u32,
    /// Rate limiting window in seconds.
    #[serde(default = "Config::default_window_secs")]
    pub window_secs: u64,
    /// Store key holding the rate limit record.
    #[serde(default = "Config::default_rate_limit_key")]
    pub rate_limit_key: String,
    /// How much of the session token is forwarded with a message.
    #[serde(default = "Config::default_token_prefix_len")]
    pub token_prefix_len: usize,
    /// SMTP relay host.
    #[serde(default = "Config::default_relay_host")]
    pub relay_host: String,
    /// SMTP relay port.
    #[serde(default = "Config::default_relay_port")]
    pub relay_port: u16,
    relay_sender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigWrapper {
    // Everything lives under the `contact` section.
    pub contact: Config,
}

impl FromStr for Config {
    type Err = crate::error::Error;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let wrapped_config: ConfigWrapper = serini::from_str(content)?;
        Ok(wrapped_config.contact)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Build a configuration with default tuning for the given dispatch target.
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
        to_email: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            to_email: to_email.into(),
            min_dwell_ms: Self::default_min_dwell_ms(),
            max_attempts: Self::default_max_attempts(),
            window_secs: Self::default_window_secs(),
            rate_limit_key: Self::default_rate_limit_key(),
            token_prefix_len: Self::default_token_prefix_len(),
            relay_host: Self::default_relay_host(),
            relay_port: Self::default_relay_port(),
            relay_sender: None,
        }
    }

    /// Envelope sender used by the SMTP relay, defaulting to `to_email`.
    pub fn relay_sender(&self) -> &str {
        self.relay_sender.as_deref().unwrap_or(&self.to_email)
    }

    /// Minimum time between form render and submit.
    pub fn min_dwell(&self) -> Duration {
        Duration::from_millis(self.min_dwell_ms)
    }

    /// Length of the rate limiting window.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    // Following are needed since serde does not support default literals.

    const fn default_min_dwell_ms() -> u64 {
        3000
    }
    const fn default_max_attempts() -> u32 {
        3
    }
    const fn default_window_secs() -> u64 {
        15 * 60
    }
    fn default_rate_limit_key() -> String {
        "form_submissions".to_string()
    }
    const fn default_token_prefix_len() -> usize {
        8
    }
    fn default_relay_host() -> String {
        "localhost".to_string()
    }
    const fn default_relay_port() -> u16 {
        25
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn test_minimal_config_uses_defaults() -> TestResult {
        let config: Config = "[contact]
service_id = service_1
template_id = template_1
public_key = pk
to_email = owner@example.org
"
        .parse()?;

        assert_eq!(config.service_id, "service_1");
        assert_eq!(config.min_dwell(), Duration::from_secs(3));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.window(), Duration::from_secs(900));
        assert_eq!(config.rate_limit_key, "form_submissions");
        assert_eq!(config.relay_port, 25);
        assert_eq!(config.relay_sender(), "owner@example.org");
        Ok(())
    }

    #[test]
    fn test_overrides() -> TestResult {
        let config: Config = "[contact]
service_id = s
template_id = t
public_key = k
to_email = owner@example.org
min_dwell_ms = 5000
max_attempts = 5
window_secs = 60
relay_host = mail.example.org
relay_port = 2525
relay_sender = noreply@example.org
"
        .parse()?;

        assert_eq!(config.min_dwell(), Duration::from_secs(5));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.relay_host, "mail.example.org");
        assert_eq!(config.relay_port, 2525);
        assert_eq!(config.relay_sender(), "noreply@example.org");
        Ok(())
    }

    #[test]
    fn test_missing_required_key_is_error() {
        let result: Result<Config, _> = "[contact]
service_id = s
"
        .parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("contact.ini");
        std::fs::write(
            &path,
            "[contact]\nservice_id = s\ntemplate_id = t\npublic_key = k\nto_email = a@b.c\n",
        )?;
        let config = Config::from_file(&path)?;
        assert_eq!(config.to_email, "a@b.c");
        Ok(())
    }
}
