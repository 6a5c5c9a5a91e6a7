//! Transport configuration.

use std::time::Duration;

pub const TIMEOUT_ENV: &str = "GRINDER_TIMEOUT_SECS";
pub const MAX_BODY_ENV: &str = "GRINDER_MAX_BODY_BYTES";
pub const MAX_REDIRECTS_ENV: &str = "GRINDER_MAX_REDIRECTS";

/// Default cap on how much of a response body is read into memory.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Settings for the default `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound on a whole call (connect, send, receive). `None` waits
    /// forever.
    pub timeout: Option<Duration>,
    pub max_body_bytes: u64,
    /// Redirects followed per call before giving up. `0` hands every 3xx
    /// back to the caller untouched.
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    /// Read overrides from `GRINDER_TIMEOUT_SECS`, `GRINDER_MAX_BODY_BYTES`
    /// and `GRINDER_MAX_REDIRECTS`.
    ///
    /// Missing or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .or(defaults.timeout);
        let max_body_bytes = lookup(MAX_BODY_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.max_body_bytes);
        let max_redirects = lookup(MAX_REDIRECTS_ENV)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.max_redirects);
        Self {
            timeout,
            max_body_bytes,
            max_redirects,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}
