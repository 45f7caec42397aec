//! Store configuration.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_STORAGE_PATH: &str = "./.jobboard/session.json";

/// Settings shared by the stores.
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Session file for `FileStorage`
    pub storage_path: PathBuf,
    /// Minimum gap between two resend requests for one destination
    pub resend_cooldown: Duration,
    /// Jobs per page
    pub page_size: u32,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            resend_cooldown: Duration::from_secs(60),
            page_size: 10,
        }
    }
}

impl StateConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_path: std::env::var("JOBBOARD_STORAGE_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            resend_cooldown: std::env::var("JOBBOARD_OTP_RESEND_COOLDOWN_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.resend_cooldown),
            page_size: std::env::var("JOBBOARD_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.page_size),
        }
    }
}
