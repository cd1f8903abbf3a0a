use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

// Prometheus metrics (default registry)
pub static ENDPOINT_PROBES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_client_endpoint_probes_total",
        "Endpoint probes by outcome",
        &["outcome"]
    )
    .expect("register endpoint_probes_total")
});

pub static STRATEGY_FALLBACKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_client_strategy_fallbacks_total",
        "Times a request strategy failed and the next one was tried",
        &["operation"]
    )
    .expect("register strategy_fallbacks_total")
});

pub static REQUEST_RETRIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "catalog_client_request_retries_total",
        "Total retry attempts"
    )
    .expect("register request_retries_total")
});
