//! Chat core configuration loaded from environment variables.
//!
//! Every setting has a default so the CLI runs with zero configuration
//! against a local database.

use std::path::PathBuf;
use std::time::Duration;

use scout_shared::constants::DEFAULT_MESSAGE_LIMIT;
use scout_shared::types::UserId;

use crate::backend::policy::RequestPolicy;

/// Chat core configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// SQLite database file.
    /// Env: `SCOUT_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// User the session acts as.
    /// Env: `SCOUT_VIEWER_ID`
    /// Default: `None` (the CLI falls back to its demo viewer).
    pub viewer_id: Option<UserId>,

    /// Timeout applied to every collaborator call.
    /// Env: `SCOUT_REQUEST_TIMEOUT_MS`
    /// Default: 10 s
    pub request_timeout: Duration,

    /// Automatic retries for read-only calls. Writes are never retried.
    /// Env: `SCOUT_MAX_RETRIES`
    /// Default: `2`
    pub max_retries: u32,

    /// First retry delay; doubles on each attempt.
    /// Env: `SCOUT_RETRY_BACKOFF_MS`
    /// Default: 250 ms
    pub retry_backoff: Duration,

    /// Most recent messages loaded per thread.
    pub message_limit: u32,

    /// Populate an empty database with demo users, threads and messages.
    /// Env: `SCOUT_SEED_DEMO` (true/false)
    /// Default: `false`
    pub seed_demo: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            viewer_id: None,
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            seed_demo: false,
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SCOUT_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(id) = std::env::var("SCOUT_VIEWER_ID") {
            let id = id.trim();
            if !id.is_empty() {
                config.viewer_id = Some(UserId::new(id));
            }
        }

        if let Ok(val) = std::env::var("SCOUT_REQUEST_TIMEOUT_MS") {
            match parse_millis(&val) {
                Some(d) if !d.is_zero() => config.request_timeout = d,
                _ => {
                    tracing::warn!(value = %val, "Invalid SCOUT_REQUEST_TIMEOUT_MS, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("SCOUT_MAX_RETRIES") {
            match val.trim().parse::<u32>() {
                Ok(n) => config.max_retries = n,
                Err(_) => tracing::warn!(value = %val, "Invalid SCOUT_MAX_RETRIES, using default"),
            }
        }

        if let Ok(val) = std::env::var("SCOUT_RETRY_BACKOFF_MS") {
            match parse_millis(&val) {
                Some(d) => config.retry_backoff = d,
                None => {
                    tracing::warn!(value = %val, "Invalid SCOUT_RETRY_BACKOFF_MS, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("SCOUT_SEED_DEMO") {
            config.seed_demo = parse_flag(&val);
        }

        config
    }

    pub fn request_policy(&self) -> RequestPolicy {
        RequestPolicy {
            timeout: self.request_timeout,
            max_retries: self.max_retries,
            base_backoff: self.retry_backoff,
        }
    }
}

fn parse_millis(val: &str) -> Option<Duration> {
    val.trim().parse::<u64>().ok().map(Duration::from_millis)
}

fn parse_flag(val: &str) -> bool {
    let val = val.trim();
    !val.is_empty() && val != "false" && val != "0"
}
