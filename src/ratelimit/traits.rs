//! Rate gate trait and types

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the gate's own storage, never by a rejected caller
#[derive(Debug, Error)]
pub enum RateGateError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Rate gate lock poisoned")]
    Poisoned,
}

/// Result type for rate gate operations
pub type RateGateResult<T> = Result<T, RateGateError>;

/// Snapshot returned by a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    /// Whether this request may proceed
    pub allowed: bool,

    /// Requests left in the current window after this one
    pub remaining: u32,
}

/// Quota over a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub quota: u32,
    pub window: chrono::Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            quota: 25,
            window: chrono::Duration::hours(24),
        }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            quota: config.quota,
            window: chrono::Duration::hours(i64::from(config.window_hours)),
        }
    }
}

/// Per-caller request budget
///
/// `limit` is an atomic check-and-record: concurrent calls for the same
/// identifier can never admit more than the quota within one window.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Consumes one unit of the caller's budget if any is left
    async fn limit(&self, identifier: &str) -> RateGateResult<RateDecision>;

    /// Reports the caller's budget without consuming it
    async fn remaining(&self, identifier: &str) -> RateGateResult<u32>;
}
