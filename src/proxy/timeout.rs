//! Timeout and retry configuration for upstream requests.

use std::time::Duration;

use crate::config::ProxyConfig;

/// Timeout configuration for upstream requests.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Time to establish a TCP connection.
    pub connect: Duration,
    /// Total time for a complete request/response.
    pub request: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration with explicit values.
    pub fn new(connect_secs: u64, request_secs: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect_secs),
            request: Duration::from_secs(request_secs),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(30),
        }
    }
}

impl From<&ProxyConfig> for TimeoutConfig {
    fn from(proxy: &ProxyConfig) -> Self {
        Self {
            connect: Duration::from_secs(proxy.connect_timeout_seconds.into()),
            request: Duration::from_secs(proxy.timeout_seconds.into()),
        }
    }
}

/// Retry configuration for upstream connection errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Max retry attempts for connection errors.
    pub max_retries: u32,
    /// Base backoff duration, doubled per attempt.
    pub backoff_base: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(100),
        }
    }
}

impl From<&ProxyConfig> for RetryConfig {
    fn from(proxy: &ProxyConfig) -> Self {
        Self {
            max_retries: proxy.max_retries,
            backoff_base: Duration::from_millis(proxy.retry_backoff_base_ms),
        }
    }
}
