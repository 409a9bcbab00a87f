//! Per-endpoint rate limiting wrapper around governor.
//!
//! DexScreener publishes two budgets: one for the promotion, profile and
//! order endpoints and a larger one for the pair endpoints. Each budget gets
//! its own direct limiter; callers wait until a permit is available.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::{debug, instrument};

/// Which request budget a call is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Boosts, ads, profiles, community takeovers, orders
    Promotion,
    /// Batched and single-token pair lookups
    Pairs,
}

/// Two independent per-minute limiters.
pub struct EndpointRateLimiter {
    promotion: DefaultDirectRateLimiter,
    pairs: DefaultDirectRateLimiter,
    promotion_per_minute: u32,
    pairs_per_minute: u32,
}

impl EndpointRateLimiter {
    /// Create a limiter pair. Zero quotas are raised to one request per minute.
    pub fn new(promotion_per_minute: u32, pairs_per_minute: u32) -> Self {
        Self {
            promotion: RateLimiter::direct(Self::quota(promotion_per_minute)),
            pairs: RateLimiter::direct(Self::quota(pairs_per_minute)),
            promotion_per_minute: promotion_per_minute.max(1),
            pairs_per_minute: pairs_per_minute.max(1),
        }
    }

    fn quota(per_minute: u32) -> Quota {
        Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN))
    }

    /// Wait until the bucket has a permit, then consume it.
    #[instrument(skip(self))]
    pub async fn until_ready(&self, bucket: Bucket) {
        match bucket {
            Bucket::Promotion => self.promotion.until_ready().await,
            Bucket::Pairs => self.pairs.until_ready().await,
        }
        debug!("Rate limit permit acquired for {:?}", bucket);
    }

    /// Configured per-minute quota of a bucket.
    pub fn quota_per_minute(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Promotion => self.promotion_per_minute,
            Bucket::Pairs => self.pairs_per_minute,
        }
    }
}
