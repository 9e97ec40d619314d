//! Per-IP rate limiting for the storefront-facing routes.
//!
//! Provider callbacks arrive from a handful of fixed addresses and must never
//! be throttled, so the limiter wraps the checkout resources only.

use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};

/// Shared limiter configuration. Clones share the same buckets.
pub type RateLimit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter replenishing `requests_per_minute` per client IP.
/// Returns `None` when the rate is zero.
pub fn rate_limit(requests_per_minute: u32) -> Option<RateLimit> {
    if requests_per_minute == 0 {
        return None;
    }
    GovernorConfigBuilder::default()
        .requests_per_minute(requests_per_minute as u64)
        .finish()
}
