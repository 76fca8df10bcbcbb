use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default User-Agent sent with page fetches
pub const DEFAULT_USER_AGENT: &str = concat!("llmstxt/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub retry: RetryConfig,
    pub extraction: ExtractionConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub generator: GeneratorConfig,
    pub export: ExportConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User-Agent header for page fetches
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Disable the private/loopback host guard (local testing only)
    #[serde(rename = "allow-private-hosts")]
    pub allow_private_hosts: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            allow_private_hosts: false,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Retry executor settings for outbound fetches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on every further retry
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
        }
    }
}

/// Content extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Reader-mode results at or below this many characters are rejected
    #[serde(rename = "min-content-length")]
    pub min_content_length: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_content_length: 100,
        }
    }
}

/// Per-caller request budget
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub quota: u32,

    /// Length of the sliding window (hours)
    #[serde(rename = "window-hours")]
    pub window_hours: u32,

    /// SQLite file backing the gate; in-memory when absent
    #[serde(rename = "database-path")]
    pub database_path: Option<PathBuf>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quota: 25,
            window_hours: 24,
            database_path: None,
        }
    }
}

/// Formatting service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the generative language REST API
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash-8b".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// Multi-page artifact export settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the artifacts are written to
    pub directory: PathBuf,

    /// Public path prefix under which the directory is served
    #[serde(rename = "url-prefix")]
    pub url_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("public/export"),
            url_prefix: "/export".to_string(),
        }
    }
}
