//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use url::Url;

/// Client configuration loaded from environment variables.
///
/// Constructed once at startup and passed to the components that need it;
/// there is no global configuration singleton.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Oasis REST API
    pub api_url: Url,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Job polling configuration
    pub polling: PollingConfig,

    /// Path of the persisted session file (token + identity snapshot)
    pub session_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Delay between consecutive job status checks
    pub interval: Duration,
    /// Total wait budget before the client gives up on a job
    pub budget: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("OASIS_API_URL")
            .unwrap_or_else(|_| "https://api.oasisapps.ai/api".to_string());
        let api_url = Url::parse(&api_url)
            .map_err(|e| anyhow!("OASIS_API_URL is not a valid URL: {}", e))?;

        Ok(Self {
            api_url,

            request_timeout: Duration::from_secs(
                env::var("OASIS_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            ),

            polling: PollingConfig {
                interval: Duration::from_secs(
                    env::var("OASIS_POLL_INTERVAL_SECS")
                        .unwrap_or_else(|_| "3".to_string())
                        .parse()
                        .unwrap_or(3),
                ),
                budget: Duration::from_secs(
                    env::var("OASIS_POLL_BUDGET_SECS")
                        .unwrap_or_else(|_| "300".to_string())
                        .parse()
                        .unwrap_or(300),
                ),
            },

            session_file: env::var("OASIS_SESSION_FILE")
                .unwrap_or_else(|_| ".oasis_session.json".to_string())
                .into(),
        })
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            budget: Duration::from_secs(300),
        }
    }
}
