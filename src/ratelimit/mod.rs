//! Per-caller rate gate
//!
//! This module handles:
//! - Resolving a caller identifier from proxy headers
//! - Enforcing a quota over a sliding window, in memory or in SQLite
//! - Building the configured gate at startup

mod identifier;
mod memory;
mod sqlite;
mod traits;

pub use identifier::{resolve_identifier, FALLBACK_IDENTIFIER};
pub use memory::MemoryRateGate;
pub use sqlite::SqliteRateGate;
pub use traits::{RateDecision, RateGate, RateGateError, RateGateResult, RateLimitPolicy};

use crate::config::RateLimitConfig;
use std::sync::Arc;

/// Builds the gate described by `config`
///
/// A `database-path` selects the SQLite gate; without one the gate lives in
/// memory and resets when the process exits.
pub fn build_rate_gate(config: &RateLimitConfig) -> RateGateResult<Arc<dyn RateGate>> {
    let policy = RateLimitPolicy::from(config);

    match &config.database_path {
        Some(path) => {
            tracing::info!("Using SQLite rate gate at {}", path.display());
            Ok(Arc::new(SqliteRateGate::open(path, policy)?))
        }
        None => {
            tracing::debug!("Using in-memory rate gate");
            Ok(Arc::new(MemoryRateGate::new(policy)))
        }
    }
}
