//! Prometheus counters for lifecycle operations.
//!
//! All recorders compile to no-ops without the `prometheus` feature so call
//! sites never need to be feature-gated.

#[cfg(feature = "prometheus")]
use metrics::counter;
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder. Call once at startup.
#[cfg(feature = "prometheus")]
pub fn init_metrics() -> Result<(), String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Install the Prometheus recorder (no-op without the prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics() -> Result<(), String> {
    Ok(())
}

/// Record rows newly soft-deleted by a cascade walk.
pub fn record_cascade_marked(table: &str, count: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "lifecycle_cascade_marked_total",
            "table" => table.to_string()
        )
        .increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (table, count);
    }
}

/// Record accounts erased by a cleanup run.
pub fn record_accounts_erased(count: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("lifecycle_accounts_erased_total").increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = count;
    }
}

/// Record a per-account erasure failure.
pub fn record_erasure_error() {
    #[cfg(feature = "prometheus")]
    {
        counter!("lifecycle_erasure_errors_total").increment(1);
    }
}
