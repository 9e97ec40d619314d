use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::{LazyLock, Once};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Checkout counters
pub static CHECKOUT_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "outside_checkout_requests_total",
            "Checkout requests by provider and result",
        ),
        &["provider", "result"],
    )
    .unwrap()
});

pub static CHECKOUT_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new("outside_checkout_latency_seconds", "Checkout build latency")
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["provider"],
    )
    .unwrap()
});

// Notification counters
pub static NOTIFICATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "outside_notifications_total",
            "Provider notifications by outcome",
        ),
        &["provider", "outcome"],
    )
    .unwrap()
});

pub static STORE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "outside_store_failures_total",
            "Purchase status updates the store rejected",
        ),
        &["provider"],
    )
    .unwrap()
});

static REGISTER: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(CHECKOUT_REQUESTS.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(CHECKOUT_LATENCY.clone()))
            .unwrap();
        REGISTRY.register(Box::new(NOTIFICATIONS.clone())).unwrap();
        REGISTRY.register(Box::new(STORE_FAILURES.clone())).unwrap();
    });
}

/// Registry contents in the Prometheus text exposition format.
pub fn metrics_output() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;

    let mut buffer = Vec::new();
    prometheus::TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
