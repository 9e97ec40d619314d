pub mod checkout;
pub mod health;
pub mod notifications;

use actix_web::web;

use crate::rate_limit::RateLimit;

/// Mount every route. Only the checkout routes are rate limited.
pub fn configure(cfg: &mut web::ServiceConfig, rate_limit: &RateLimit) {
    health::configure(cfg);
    notifications::configure(cfg);
    checkout::configure(cfg, rate_limit);
}
