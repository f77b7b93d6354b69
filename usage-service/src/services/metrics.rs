//! Metrics module for usage-service.
//! Prometheus metrics for ledger, quota, and recommendation operations.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_counter_vec, register_histogram_vec, register_int_counter_vec,
    CounterVec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("usage_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Ledger records counter by service and outcome
pub static USAGE_RECORDS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Ledger appends that failed and were swallowed
pub static LEDGER_APPEND_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Recorded cost by service and model (monetary tracking)
pub static RECORDED_COST_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Quota checks by usage type and verdict
pub static QUOTA_CHECKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Quota increments by usage type
pub static QUOTA_INCREMENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Recommendations served by urgency (or "unavailable")
pub static RECOMMENDATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Daily cost threshold alerts
pub static COST_ALERTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    USAGE_RECORDS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_records_total",
                "Total ledger records by service and outcome"
            ),
            &["service", "outcome"]
        )
        .expect("Failed to register USAGE_RECORDS_TOTAL")
    });

    LEDGER_APPEND_FAILURES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_ledger_append_failures_total",
                "Ledger appends that failed and were swallowed"
            ),
            &["service"]
        )
        .expect("Failed to register LEDGER_APPEND_FAILURES_TOTAL")
    });

    RECORDED_COST_TOTAL.get_or_init(|| {
        register_counter_vec!(
            opts!(
                "usage_recorded_cost_total",
                "Total recorded cost (USD) by service and model"
            ),
            &["service", "model"]
        )
        .expect("Failed to register RECORDED_COST_TOTAL")
    });

    QUOTA_CHECKS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_quota_checks_total",
                "Quota checks by usage type and verdict"
            ),
            &["usage_type", "allowed"]
        )
        .expect("Failed to register QUOTA_CHECKS_TOTAL")
    });

    QUOTA_INCREMENTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("usage_quota_increments_total", "Quota increments by type"),
            &["usage_type"]
        )
        .expect("Failed to register QUOTA_INCREMENTS_TOTAL")
    });

    RECOMMENDATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_recommendations_total",
                "Plan recommendations served by urgency"
            ),
            &["urgency"]
        )
        .expect("Failed to register RECOMMENDATIONS_TOTAL")
    });

    COST_ALERTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_cost_alerts_total",
                "Daily cost threshold breaches observed"
            ),
            &["date"]
        )
        .expect("Failed to register COST_ALERTS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a ledger append.
pub fn record_usage_record(service: &str, outcome: &str) {
    if let Some(counter) = USAGE_RECORDS_TOTAL.get() {
        counter.with_label_values(&[service, outcome]).inc();
    }
}

/// Record a swallowed ledger-append failure.
pub fn record_append_failure(service: &str) {
    if let Some(counter) = LEDGER_APPEND_FAILURES_TOTAL.get() {
        counter.with_label_values(&[service]).inc();
    }
}

/// Record the cost of a billed operation.
pub fn record_cost(service: &str, model: &str, amount: f64) {
    if let Some(counter) = RECORDED_COST_TOTAL.get() {
        counter
            .with_label_values(&[service, model])
            .inc_by(amount.abs());
    }
}

/// Record a quota check verdict.
pub fn record_quota_check(usage_type: &str, allowed: bool) {
    if let Some(counter) = QUOTA_CHECKS_TOTAL.get() {
        counter
            .with_label_values(&[usage_type, if allowed { "true" } else { "false" }])
            .inc();
    }
}

/// Record a quota increment.
pub fn record_quota_increment(usage_type: &str) {
    if let Some(counter) = QUOTA_INCREMENTS_TOTAL.get() {
        counter.with_label_values(&[usage_type]).inc();
    }
}

/// Record a served recommendation.
pub fn record_recommendation(urgency: &str) {
    if let Some(counter) = RECOMMENDATIONS_TOTAL.get() {
        counter.with_label_values(&[urgency]).inc();
    }
}

/// Record a daily cost threshold breach.
pub fn record_cost_alert(date: &str) {
    if let Some(counter) = COST_ALERTS_TOTAL.get() {
        counter.with_label_values(&[date]).inc();
    }
}
