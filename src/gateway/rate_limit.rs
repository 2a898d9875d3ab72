//! Per-client admission control for the classification endpoint.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::gateway::error::GatewayError;

/// Token-bucket limiter keyed by peer IP.
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    per_minute: NonZeroU32,
}

impl ClientRateLimiter {
    /// A zero rate is treated as one request per minute.
    pub fn per_minute(requests: u32) -> Self {
        let per_minute = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            per_minute,
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.per_minute.get()
    }

    /// Consumes one cell for `client`, or reports how long until one frees up.
    pub fn check(&self, client: IpAddr) -> Result<(), GatewayError> {
        self.limiter.check_key(&client).map_err(|not_until| {
            let retry_after = not_until.wait_time_from(DefaultClock::default().now());
            warn!(
                client = %client,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            GatewayError::RateLimited {
                client,
                retry_after,
            }
        })
    }

    /// Drops state for clients whose buckets have fully refilled.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("per_minute", &self.per_minute)
            .finish_non_exhaustive()
    }
}
