//! Client configuration.

use std::time::Duration;

/// Environment variable naming the node base URL.
pub const SERVER_ENV: &str = "APL_SERVER";

const DEFAULT_BASE_URL: &str = "http://localhost:7876";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for an [`AplClient`](crate::AplClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Node root URL without a trailing slash (e.g. `http://localhost:7876`).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read the base URL from `APL_SERVER`, falling back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(SERVER_ENV) {
            Some(url) if !url.trim().is_empty() => Self {
                base_url: url.trim().trim_end_matches('/').to_string(),
                ..Default::default()
            },
            _ => Self::default(),
        }
    }
}
