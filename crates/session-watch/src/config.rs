use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How often to poll the session API (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Timeout applied to each API request and each mail delivery (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Consecutive failed cycles before the scheduler escalates to a warning
    #[serde(default = "default_failure_alert_threshold")]
    pub failure_alert_threshold: u32,

    pub opus: OpusConfig,

    pub smtp: SmtpConfig,

    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpusConfig {
    /// Session listing endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    pub client_guid: String,

    pub event_id: String,

    pub username: String,

    /// API password; `OPUS_PASSWORD` overrides this
    #[serde(default)]
    pub password: String,

    /// Send the `modified_date_time > cursor` filter once a cursor exists.
    /// With this off every poll fetches the full session list.
    #[serde(default = "default_true")]
    pub incremental: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465)
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587)
    Starttls,
    /// Unencrypted, for local relays only
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default = "default_smtp_security")]
    pub security: SmtpSecurity,

    #[serde(default)]
    pub username: Option<String>,

    /// SMTP password; `SMTP_PASSWORD` overrides this
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from: String,

    pub to: Vec<String>,

    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_poll_interval() -> u64 {
    600 // 10 minutes
}

fn default_request_timeout() -> u64 {
    30
}

fn default_failure_alert_threshold() -> u32 {
    3
}

fn default_api_url() -> String {
    "https://api.opus.agency/api/1.4/getEventSessions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_security() -> SmtpSecurity {
    SmtpSecurity::Tls
}

fn default_subject() -> String {
    "Opus session changes".to_string()
}

impl Config {
    /// Load from a TOML file, apply secret overrides from the environment
    /// and validate.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("OPUS_PASSWORD") {
            self.opus.password = password;
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            self.smtp.password = Some(password);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.opus.client_guid.is_empty() || self.opus.event_id.is_empty() {
            bail!("opus.client_guid and opus.event_id must be set");
        }
        if self.email.to.is_empty() {
            bail!("email.to must list at least one recipient");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn example() -> Self {
        Config {
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            failure_alert_threshold: default_failure_alert_threshold(),
            opus: OpusConfig {
                api_url: default_api_url(),
                client_guid: "00000000-0000-0000-0000-000000000000".to_string(),
                event_id: "1234".to_string(),
                username: "api-user".to_string(),
                password: "api-password".to_string(),
                incremental: true,
            },
            smtp: SmtpConfig {
                host: "smtp.gmail.com".to_string(),
                port: default_smtp_port(),
                security: SmtpSecurity::Tls,
                username: Some("you@gmail.com".to_string()),
                password: Some("your-app-password".to_string()),
            },
            email: EmailConfig {
                from: "Session Watch <you@gmail.com>".to_string(),
                to: vec!["team@example.com".to_string()],
                subject: default_subject(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [opus]
        client_guid = "abc-123"
        event_id = "77"
        username = "user"
        password = "secret"

        [smtp]
        host = "localhost"

        [email]
        from = "watch@example.com"
        to = ["ops@example.com"]
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.poll_interval_secs, 600);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.failure_alert_threshold, 3);
        assert_eq!(
            config.opus.api_url,
            "https://api.opus.agency/api/1.4/getEventSessions"
        );
        assert!(config.opus.incremental);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.smtp.security, SmtpSecurity::Tls);
        assert_eq!(config.email.subject, "Opus session changes");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_security_parses_lowercase() {
        let toml = MINIMAL.replace(
            "host = \"localhost\"",
            "host = \"localhost\"\nsecurity = \"starttls\"\nport = 587",
        );
        let config = Config::from_toml(&toml).unwrap();

        assert_eq!(config.smtp.security, SmtpSecurity::Starttls);
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn test_validate_rejects_empty_recipients() {
        let mut config = Config::from_toml(MINIMAL).unwrap();
        config.email.to.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::from_toml(MINIMAL).unwrap();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_round_trips_through_toml() {
        let rendered = toml::to_string_pretty(&Config::example()).unwrap();
        let parsed = Config::from_toml(&rendered).unwrap();

        assert_eq!(parsed.opus.event_id, "1234");
        assert!(parsed.validate().is_ok());
    }
}
