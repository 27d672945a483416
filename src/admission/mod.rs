//! Admission control: per-key sliding-window rate limiting.
//!
//! # Responsibilities
//! - Accept or reject a request before it consumes downstream resources
//! - Track admitted weight per (route, key) in a trailing window
//! - Report `retry_after` from the oldest still-counted event on rejection
//!
//! # Design Decisions
//! - Key-sharded map with a per-window mutex: increment-and-check is atomic
//!   per key without serializing unrelated keys
//! - Synchronous and non-blocking; rejection never queues the caller
//! - Windows are ephemeral; a restart only under-limits briefly

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::AdmissionConfig;
use crate::observability::metrics;

/// What a route's window counts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateScope {
    Identity,
    Ip,
}

/// Counter key. Authenticated routes count per identity, anonymous routes
/// per client IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKey {
    Identity(Uuid),
    Ip(IpAddr),
}

impl std::fmt::Display for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateKey::Identity(id) => write!(f, "identity:{id}"),
            RateKey::Ip(ip) => write!(f, "ip:{ip}"),
        }
    }
}

/// Errors surfaced by the admission stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

/// Effective (limit, window, scope) policy for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatePolicy {
    pub limit: u32,
    pub window: Duration,
    pub scope: RateScope,
}

struct Window {
    events: VecDeque<(u64, u32)>,
    total_weight: u32,
}

impl Window {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            total_weight: 0,
        }
    }

    fn evict_expired(&mut self, now_ms: u64, window_ms: u64) {
        while let Some(&(ts, weight)) = self.events.front() {
            if ts + window_ms <= now_ms {
                self.events.pop_front();
                self.total_weight -= weight;
            } else {
                break;
            }
        }
    }
}

/// Sliding-window admission counters, sharded by (route, key).
pub struct RateLimiter {
    windows: DashMap<(String, RateKey), Mutex<Window>>,
    policies: HashMap<String, RatePolicy>,
    default_policy: RatePolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        let policies = config
            .routes
            .iter()
            .map(|r| {
                (
                    r.route.clone(),
                    RatePolicy {
                        limit: r.limit,
                        window: Duration::from_secs(r.window_secs),
                        scope: r.scope,
                    },
                )
            })
            .collect();
        Self {
            windows: DashMap::new(),
            policies,
            default_policy: RatePolicy {
                limit: config.default_limit,
                window: Duration::from_secs(config.default_window_secs),
                scope: RateScope::Identity,
            },
            clock,
        }
    }

    /// Policy in force for a route (configured or default).
    pub fn policy(&self, route: &str) -> &RatePolicy {
        self.policies.get(route).unwrap_or(&self.default_policy)
    }

    /// Pick the counter key for a request under the route's scope. An
    /// identity-scoped route falls back to the client IP for anonymous
    /// callers.
    pub fn key_for(&self, route: &str, identity_id: Option<Uuid>, ip: IpAddr) -> RateKey {
        match self.policy(route).scope {
            RateScope::Identity => identity_id
                .map(RateKey::Identity)
                .unwrap_or(RateKey::Ip(ip)),
            RateScope::Ip => RateKey::Ip(ip),
        }
    }

    /// Admit one unit of work.
    pub fn try_admit(&self, route: &str, key: RateKey) -> Result<(), AdmissionError> {
        self.try_admit_weighted(route, key, 1)
    }

    /// Admit `weight` units iff the trailing window stays under the limit.
    pub fn try_admit_weighted(
        &self,
        route: &str,
        key: RateKey,
        weight: u32,
    ) -> Result<(), AdmissionError> {
        let policy = self.policy(route).clone();
        let window_ms = policy.window.as_millis() as u64;
        let now = self.clock.now_millis();

        let entry = self
            .windows
            .entry((route.to_string(), key))
            .or_insert_with(|| Mutex::new(Window::new()));
        let mut window = entry.lock().expect("rate window mutex poisoned");

        window.evict_expired(now, window_ms);

        if window.total_weight < policy.limit && weight <= policy.limit - window.total_weight {
            window.events.push_back((now, weight));
            window.total_weight += weight;
            Ok(())
        } else {
            // Walk forward to the event whose expiry frees enough weight
            // for this request, not just the oldest one.
            let shortfall = weight.saturating_sub(policy.limit.saturating_sub(window.total_weight));
            let mut freed = 0u32;
            let mut retry_after = policy.window;
            for &(ts, event_weight) in window.events.iter() {
                freed += event_weight;
                if freed >= shortfall {
                    retry_after = Duration::from_millis((ts + window_ms).saturating_sub(now));
                    break;
                }
            }
            tracing::warn!(route, key = %key, retry_after_ms = retry_after.as_millis() as u64, "admission rejected");
            metrics::record_rate_limited(route);
            Err(AdmissionError::RateLimited { retry_after })
        }
    }
}
