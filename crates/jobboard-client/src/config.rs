//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::retry::RetryConfig;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

// =============================================================================
// Configuration
// =============================================================================

/// Base URLs and transport settings for the three backend services.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Auth/user service base URL (`/auth/*`, `/users/*`).
    pub auth_url: String,
    /// Profile/company service base URL (`/profiles/*`, `/companies/*`).
    pub profile_url: String,
    /// Job/application service base URL (`/jobs/*`, `/applications/*`).
    pub job_url: String,
    /// Whole-request timeout. Expiry surfaces as [`ApiError::Timeout`].
    pub timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Retry configuration, applied to idempotent reads only.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_BASE_URL.to_string(),
            profile_url: DEFAULT_BASE_URL.to_string(),
            job_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// All three services behind one base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            auth_url: base_url.clone(),
            profile_url: base_url.clone(),
            job_url: base_url,
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let url = |key: &str| std::env::var(key).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let secs = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        let config = Self {
            auth_url: url("JOBBOARD_AUTH_URL"),
            profile_url: url("JOBBOARD_PROFILE_URL"),
            job_url: url("JOBBOARD_JOB_URL"),
            timeout: Duration::from_secs(secs("JOBBOARD_TIMEOUT_SECS", 20)),
            connect_timeout: Duration::from_secs(secs("JOBBOARD_CONNECT_TIMEOUT_SECS", 5)),
            retry: RetryConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every base URL is a usable absolute http(s) URL.
    pub fn validate(&self) -> ApiResult<()> {
        for (name, value) in [
            ("JOBBOARD_AUTH_URL", &self.auth_url),
            ("JOBBOARD_PROFILE_URL", &self.profile_url),
            ("JOBBOARD_JOB_URL", &self.job_url),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::Config(format!("{} cannot be empty", name)));
            }
            let parsed = Url::parse(value)
                .map_err(|e| ApiError::Config(format!("{} is not a valid URL: {}", name, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ApiError::Config(format!("{} must be http or https", name)));
            }
        }
        Ok(())
    }
}
