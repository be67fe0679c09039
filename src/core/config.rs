use std::env;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_MAX_ATTEMPTS: usize = 120;
const DEFAULT_SUPPORT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub poll_interval: Duration,
    pub poll_max_attempts: usize,
    pub support_language: String,
    pub cognito_client_secret_param: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            support_language: DEFAULT_SUPPORT_LANGUAGE.to_string(),
            cognito_client_secret_param: None,
        }
    }
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error if a numeric setting is present but not a valid number.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't touch the process env.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric setting is present but not a valid number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll_interval = match non_empty("AWS_ACTIONS_POLL_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| format!("AWS_ACTIONS_POLL_INTERVAL_SECS: {e}"))?,
            ),
            None => defaults.poll_interval,
        };

        let poll_max_attempts = match non_empty("AWS_ACTIONS_POLL_MAX_ATTEMPTS") {
            Some(raw) => {
                let attempts = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| format!("AWS_ACTIONS_POLL_MAX_ATTEMPTS: {e}"))?;
                if attempts == 0 {
                    return Err("AWS_ACTIONS_POLL_MAX_ATTEMPTS: must be at least 1".to_string());
                }
                attempts
            }
            None => defaults.poll_max_attempts,
        };

        Ok(Self {
            region: non_empty("AWS_ACTIONS_REGION"),
            endpoint_url: non_empty("AWS_ACTIONS_ENDPOINT_URL"),
            poll_interval,
            poll_max_attempts,
            support_language: non_empty("AWS_ACTIONS_SUPPORT_LANGUAGE")
                .unwrap_or(defaults.support_language),
            cognito_client_secret_param: non_empty("COGNITO_CLIENT_SECRET_PARAM"),
        })
    }

    #[must_use]
    pub fn with_overrides(mut self, region: Option<String>, endpoint_url: Option<String>) -> Self {
        if region.is_some() {
            self.region = region;
        }
        if endpoint_url.is_some() {
            self.endpoint_url = endpoint_url;
        }
        self
    }
}
