//! Shared token-bucket rate limiting for external-service fan-out
//! (Acquirer's literature service, Resolver's per-type services, §5).

use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a token bucket allowing `per_second` requests/s, shared (via `Arc`)
/// across every worker that calls the same external service.
pub fn per_second(per_second: u32) -> SharedLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(nonzero!(1u32));
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

/// Block the calling task until the bucket yields a token.
pub async fn acquire(limiter: &SharedLimiter) {
    limiter.until_ready().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limiter_admits_first_call_immediately() {
        let limiter = per_second(5);
        acquire(&limiter).await;
    }
}
