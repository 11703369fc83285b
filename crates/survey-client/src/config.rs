use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection settings for the survey API, injected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://example.org/api`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins `path` onto the base URL without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ApiError::InvalidConfig("base_url cannot be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ApiError::InvalidConfig(format!(
                "base_url '{}' must start with http:// or https://",
                base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig::new("http://localhost:8000/api/");
        assert_eq!(
            config.endpoint("/survey/details"),
            "http://localhost:8000/api/survey/details"
        );
    }

    #[test]
    fn timeout_defaults_when_missing() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "base_url": "https://surveys.test" }"#).expect("json");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_scheme_and_zero_timeout() {
        assert!(ClientConfig::new("ftp://host").validate().is_err());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(
            ClientConfig::new("http://host")
                .with_timeout_secs(0)
                .validate()
                .is_err()
        );
    }
}
