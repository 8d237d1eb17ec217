use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for an Elo server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as `x-api-key` on every request when set
    #[serde(default)]
    pub api_key: Option<String>,

    /// Applies uniformly to every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_timeout_secs() -> f64 {
    10.0
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f64();
        self
    }

    /// Base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Request timeout, or None when `timeout_secs` is negative or not finite
    pub fn timeout(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs).ok()
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ClientConfig = serde_json::from_str(r#"{ "api_key": "seu_token" }"#).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
        assert_eq!(config.api_key.as_deref(), Some("seu_token"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let config = ClientConfig::new("http://localhost:3000//");
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = ClientConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));

        config.timeout_secs = -1.0;
        assert_eq!(config.timeout(), None);
        config.timeout_secs = f64::NAN;
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ClientConfig::load("./does-not-exist/elo.json").is_err());
    }
}
