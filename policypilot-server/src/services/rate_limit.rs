//! Per-actor, per-action rate limiting
//!
//! Throttles expensive side-effectful admin actions (publish, nudge send)
//! keyed by `(org, user, action)`. Unrelated keys never contend: the keyed
//! limiter tracks an independent bucket per key.

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use uuid::Uuid;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Caller-facing retry hint, set when the limit was exceeded
    pub retry_after_ms: Option<u64>,
}

/// Keyed token-bucket limiter over `(org, user, action)` composite keys
pub struct ActionRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    clock: DefaultClock,
}

impl ActionRateLimiter {
    /// Allow `per_minute` actions per key, with the same burst capacity
    pub fn new(per_minute: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
        }
    }

    /// Check and consume one slot for this actor/action pair
    pub fn check(&self, org_id: Uuid, user_id: Uuid, action: &str) -> RateLimitDecision {
        let key = format!("{}:{}:{}", org_id, user_id, action);

        match self.limiter.check_key(&key) {
            Ok(()) => RateLimitDecision {
                allowed: true,
                retry_after_ms: None,
            },
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                RateLimitDecision {
                    allowed: false,
                    retry_after_ms: Some(wait.as_millis() as u64),
                }
            }
        }
    }
}

impl Default for ActionRateLimiter {
    fn default() -> Self {
        // 5 publishes/nudges per minute per actor is generous for humans
        // and still caps runaway retry loops
        Self::new(NonZeroU32::new(5).unwrap())
    }
}
