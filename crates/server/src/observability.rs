use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry), labelled by resource
pub static RECORDS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_records_created_total",
        "Catalog records created",
        &["resource"]
    )
    .expect("register records_created_total")
});

pub static RECORDS_UPDATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_records_updated_total",
        "Catalog records updated, image-only updates included",
        &["resource"]
    )
    .expect("register records_updated_total")
});

pub static RECORDS_DELETED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_records_deleted_total",
        "Catalog records deleted",
        &["resource"]
    )
    .expect("register records_deleted_total")
});

/// Default registry in the Prometheus text format.
pub fn encode_metrics() -> (StatusCode, String) {
    let mut buffer = Vec::new();
    match TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned()),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        RECORDS_CREATED_TOTAL.with_label_values(&["category"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("catalog_records_created_total{resource=\"category\"}"));
    }
}
