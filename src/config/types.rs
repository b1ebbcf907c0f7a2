use serde::{Deserialize, Serialize};

/// Model identifier targeted when no `[route].models` list is configured.
pub const DEFAULT_TARGET_MODEL: &str = "gpt-5.1-codex-mini";

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub route: RouteConfig,
}

/// Server and upstream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Address the proxy listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Base URL requests are forwarded to (e.g., "https://api.openai.com").
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Max retry attempts for connection errors (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds for retry (default: 100).
    #[serde(default = "default_retry_backoff_base_ms")]
    pub retry_backoff_base_ms: u64,
}

/// Model-route settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Model identifiers that trigger the chat-completions → responses
    /// rewrite. Absent means the built-in default model; present but empty
    /// is rejected at startup.
    pub models: Option<Vec<String>>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_upstream_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_base_ms() -> u64 {
    100
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            upstream_base_url: default_upstream_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_base_ms: default_retry_backoff_base_ms(),
        }
    }
}
