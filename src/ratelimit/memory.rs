use crate::ratelimit::traits::{
    RateDecision, RateGate, RateGateError, RateGateResult, RateLimitPolicy,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-process sliding-window gate
///
/// Keeps a log of admitted request times per identifier. Entries older than
/// the window are pruned on every access.
#[derive(Debug)]
pub struct MemoryRateGate {
    policy: RateLimitPolicy,
    hits: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl MemoryRateGate {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// `limit` evaluated at an explicit instant
    ///
    /// Every call also drops the logs of identifiers whose hits have all
    /// expired, so the map only holds callers active within the window.
    pub fn limit_at(&self, identifier: &str, now: DateTime<Utc>) -> RateGateResult<RateDecision> {
        let mut hits = self.hits.lock().map_err(|_| RateGateError::Poisoned)?;
        let cutoff = now - self.policy.window;
        hits.retain(|_, log| {
            prune(log, cutoff);
            !log.is_empty()
        });

        let log = hits.entry(identifier.to_string()).or_default();
        let used = log.len() as u32;
        if used >= self.policy.quota {
            if log.is_empty() {
                hits.remove(identifier);
            }
            return Ok(RateDecision {
                allowed: false,
                remaining: 0,
            });
        }

        log.push_back(now);
        Ok(RateDecision {
            allowed: true,
            remaining: self.policy.quota - used - 1,
        })
    }

    /// `remaining` evaluated at an explicit instant
    pub fn remaining_at(&self, identifier: &str, now: DateTime<Utc>) -> RateGateResult<u32> {
        let mut hits = self.hits.lock().map_err(|_| RateGateError::Poisoned)?;
        let used = match hits.get_mut(identifier) {
            Some(log) => {
                prune(log, now - self.policy.window);
                log.len() as u32
            }
            None => 0,
        };
        if used == 0 {
            hits.remove(identifier);
        }
        Ok(self.policy.quota.saturating_sub(used))
    }
}

/// Drops hits at or before `cutoff`
fn prune(log: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while log.front().map(|hit| *hit <= cutoff).unwrap_or(false) {
        log.pop_front();
    }
}

#[async_trait]
impl RateGate for MemoryRateGate {
    async fn limit(&self, identifier: &str) -> RateGateResult<RateDecision> {
        self.limit_at(identifier, Utc::now())
    }

    async fn remaining(&self, identifier: &str) -> RateGateResult<u32> {
        self.remaining_at(identifier, Utc::now())
    }
}
