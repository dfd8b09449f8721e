//! Metrics collection and monitoring for the villa server
//!
//! This module provides metrics collection using Prometheus, kept cheap
//! enough to sit on every store mutation and API request.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Counters for document store operations
pub struct StoreMetrics {
    /// Documents written (add, set, update)
    pub writes: IntCounter,
    /// Documents deleted
    pub deletes: IntCounter,
    /// Collection scans executed
    pub queries: IntCounter,
    /// Successful full-file saves
    pub saves: IntCounter,
    /// Saves that failed and left a mutation memory-only
    pub save_failures: IntCounter,
}

/// Counters for the external AI collaborator
pub struct AiMetrics {
    /// Completion requests issued
    pub requests: IntCounterVec,
    /// Completion requests that errored or were rejected
    pub failures: IntCounterVec,
}

static STORE: Lazy<StoreMetrics> = Lazy::new(|| StoreMetrics {
    writes: register_int_counter!("villa_store_writes_total", "Documents written to the store")
        .expect("metric registration"),
    deletes: register_int_counter!("villa_store_deletes_total", "Documents deleted from the store")
        .expect("metric registration"),
    queries: register_int_counter!("villa_store_queries_total", "Collection scans executed")
        .expect("metric registration"),
    saves: register_int_counter!("villa_store_saves_total", "Successful store file saves")
        .expect("metric registration"),
    save_failures: register_int_counter!(
        "villa_store_save_failures_total",
        "Store file saves that failed"
    )
    .expect("metric registration"),
});

static AI: Lazy<AiMetrics> = Lazy::new(|| AiMetrics {
    requests: register_int_counter_vec!(
        "villa_ai_requests_total",
        "AI completion requests by model",
        &["model"]
    )
    .expect("metric registration"),
    failures: register_int_counter_vec!(
        "villa_ai_failures_total",
        "Failed AI completion requests by model",
        &["model"]
    )
    .expect("metric registration"),
});

/// Store operation counters
pub fn store() -> &'static StoreMetrics {
    &STORE
}

/// AI collaborator counters
pub fn ai() -> &'static AiMetrics {
    &AI
}

/// Force registration of all metric families so they appear in the
/// exposition before their first increment
pub fn init_registry() {
    Lazy::force(&STORE);
    Lazy::force(&AI);
}

/// Render the default registry in Prometheus text exposition format
pub fn render() -> Result<String> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_render() {
        init_registry();
        store().writes.inc();
        ai().requests.with_label_values(&["gpt-4o"]).inc();

        let text = render().unwrap();
        assert!(text.contains("villa_store_writes_total"));
        assert!(text.contains("villa_ai_requests_total"));
    }
}
