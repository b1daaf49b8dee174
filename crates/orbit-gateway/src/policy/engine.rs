use std::collections::{BTreeMap, HashMap};

use orbit_core::error::OrbitError;

use super::limiter::{Identity, RateDecision, RateKey, RateLimiter};
use super::rate::{EndpointGroup, Rate};

/// Decision from policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Pass,
    Reject { retry_after_secs: u64 },
}

impl PolicyDecision {
    pub fn into_result(self) -> orbit_core::Result<()> {
        match self {
            PolicyDecision::Pass => Ok(()),
            PolicyDecision::Reject { retry_after_secs } => {
                Err(OrbitError::RateLimited { retry_after_secs })
            }
        }
    }
}

/// Per-endpoint-group request policy.
/// Construct once at startup, then share via Arc.
pub struct RequestPolicy {
    rates: HashMap<EndpointGroup, Rate>,
    limiter: RateLimiter,
}

impl RequestPolicy {
    /// Groups mapped to `None` are not limited.
    pub fn new(rates: BTreeMap<EndpointGroup, Option<Rate>>, limiter: RateLimiter) -> Self {
        let rates = rates
            .into_iter()
            .filter_map(|(g, r)| r.map(|r| (g, r)))
            .collect();
        Self { rates, limiter }
    }

    pub fn rate(&self, group: EndpointGroup) -> Option<Rate> {
        self.rates.get(&group).copied()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Count the request and decide whether it may proceed.
    pub fn check(&self, group: EndpointGroup, identity: Identity) -> PolicyDecision {
        let Some(rate) = self.rate(group) else {
            return PolicyDecision::Pass;
        };

        let key = RateKey::new(group, identity);
        match self.limiter.check_and_increment(&key, rate) {
            RateDecision::Allowed { .. } => PolicyDecision::Pass,
            RateDecision::Rejected { count, retry_after } => {
                tracing::warn!(%key, %rate, count, "rate limit exceeded");
                PolicyDecision::Reject {
                    retry_after_secs: retry_after_secs(retry_after.as_secs_f64()),
                }
            }
        }
    }
}

/// Round up to whole seconds, minimum 1 (HTTP `Retry-After`).
fn retry_after_secs(secs: f64) -> u64 {
    (secs.ceil() as u64).max(1)
}
