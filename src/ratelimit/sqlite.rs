//! SQLite-backed sliding-window gate
//!
//! Survives restarts and can be shared by several processes pointing at the
//! same database file.

use crate::ratelimit::traits::{
    RateDecision, RateGate, RateGateError, RateGateResult, RateLimitPolicy,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rate_hits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier TEXT NOT NULL,
    hit_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rate_hits_identifier ON rate_hits(identifier, hit_at);
"#;

/// Persistent sliding-window gate
pub struct SqliteRateGate {
    policy: RateLimitPolicy,
    conn: Mutex<Connection>,
}

impl SqliteRateGate {
    /// Opens (or creates) the gate database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `policy` - Quota and window to enforce
    pub fn open(path: &Path, policy: RateLimitPolicy) -> RateGateResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        Self::with_connection(conn, policy)
    }

    /// Creates a gate backed by an in-memory database
    pub fn open_in_memory(policy: RateLimitPolicy) -> RateGateResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, policy)
    }

    fn with_connection(conn: Connection, policy: RateLimitPolicy) -> RateGateResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            policy,
            conn: Mutex::new(conn),
        })
    }

    /// `limit` evaluated at an explicit instant
    ///
    /// Prune, count and insert run in one IMMEDIATE transaction, so writers
    /// on other connections are serialized behind it.
    pub fn limit_at(&self, identifier: &str, now: DateTime<Utc>) -> RateGateResult<RateDecision> {
        let mut conn = self.conn.lock().map_err(|_| RateGateError::Poisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cutoff = (now - self.policy.window).timestamp_millis();
        tx.execute(
            "DELETE FROM rate_hits WHERE identifier = ?1 AND hit_at <= ?2",
            params![identifier, cutoff],
        )?;

        let used: u32 = tx.query_row(
            "SELECT COUNT(*) FROM rate_hits WHERE identifier = ?1",
            params![identifier],
            |row| row.get(0),
        )?;

        if used >= self.policy.quota {
            tx.commit()?;
            return Ok(RateDecision {
                allowed: false,
                remaining: 0,
            });
        }

        tx.execute(
            "INSERT INTO rate_hits (identifier, hit_at) VALUES (?1, ?2)",
            params![identifier, now.timestamp_millis()],
        )?;
        tx.commit()?;

        Ok(RateDecision {
            allowed: true,
            remaining: self.policy.quota - used - 1,
        })
    }

    /// `remaining` evaluated at an explicit instant
    pub fn remaining_at(&self, identifier: &str, now: DateTime<Utc>) -> RateGateResult<u32> {
        let conn = self.conn.lock().map_err(|_| RateGateError::Poisoned)?;
        let cutoff = (now - self.policy.window).timestamp_millis();

        let used: u32 = conn.query_row(
            "SELECT COUNT(*) FROM rate_hits WHERE identifier = ?1 AND hit_at > ?2",
            params![identifier, cutoff],
            |row| row.get(0),
        )?;

        Ok(self.policy.quota.saturating_sub(used))
    }
}

#[async_trait]
impl RateGate for SqliteRateGate {
    async fn limit(&self, identifier: &str) -> RateGateResult<RateDecision> {
        self.limit_at(identifier, Utc::now())
    }

    async fn remaining(&self, identifier: &str) -> RateGateResult<u32> {
        self.remaining_at(identifier, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn policy(quota: u32) -> RateLimitPolicy {
        RateLimitPolicy {
            quota,
            window: Duration::hours(24),
        }
    }

    #[test]
    fn test_quota_then_denied() {
        let gate = SqliteRateGate::open_in_memory(policy(3)).unwrap();
        let now = Utc::now();

        let allowed: Vec<bool> = (0..5)
            .map(|_| gate.limit_at("1.2.3.4", now).unwrap().allowed)
            .collect();

        assert_eq!(allowed, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_remaining_after_quota_minus_one() {
        let gate = SqliteRateGate::open_in_memory(policy(4)).unwrap();
        let now = Utc::now();

        for _ in 0..3 {
            gate.limit_at("client", now).unwrap();
        }

        assert_eq!(gate.remaining_at("client", now).unwrap(), 1);
    }

    #[test]
    fn test_expired_hits_are_pruned() {
        let gate = SqliteRateGate::open_in_memory(policy(1)).unwrap();
        let start = Utc::now();

        assert!(gate.limit_at("a", start).unwrap().allowed);
        assert!(!gate.limit_at("a", start + Duration::hours(1)).unwrap().allowed);

        let later = start + Duration::hours(25);
        assert_eq!(gate.remaining_at("a", later).unwrap(), 1);
        assert!(gate.limit_at("a", later).unwrap().allowed);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rate.db");
        let now = Utc::now();

        {
            let gate = SqliteRateGate::open(&path, policy(2)).unwrap();
            gate.limit_at("a", now).unwrap();
        }

        let gate = SqliteRateGate::open(&path, policy(2)).unwrap();
        assert_eq!(gate.remaining_at("a", now).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_trait_object() {
        let gate: Box<dyn RateGate> = Box::new(SqliteRateGate::open_in_memory(policy(1)).unwrap());

        assert!(gate.limit("x").await.unwrap().allowed);
        assert!(!gate.limit("x").await.unwrap().allowed);
        assert_eq!(gate.remaining("x").await.unwrap(), 0);
    }
}
