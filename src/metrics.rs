use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::aggregator::RowStats;

/// Install the Prometheus recorder and describe the service metrics
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "cost_aggregations_total",
        "Total number of aggregation runs"
    );
    describe_counter!(
        "cost_rows_total",
        "Rows seen by the aggregator, by outcome"
    );
    describe_counter!(
        "upstream_requests_total",
        "Requests sent to billing and report APIs"
    );
    describe_histogram!(
        "upstream_request_duration_seconds",
        "Upstream request duration in seconds"
    );
    describe_gauge!(
        "cost_analytics_info",
        "Service version information"
    );

    gauge!("cost_analytics_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record one aggregation run and its row outcomes
pub fn record_aggregation(source: &'static str, stats: &RowStats) {
    counter!("cost_aggregations_total", "source" => source).increment(1);

    for (outcome, count) in stats.by_outcome() {
        counter!("cost_rows_total", "source" => source, "outcome" => outcome)
            .increment(count as u64);
    }
}

/// Record an upstream call. `status` is the HTTP status or "error".
pub fn record_upstream(target: &'static str, status: &str, duration: Duration) {
    counter!(
        "upstream_requests_total",
        "target" => target,
        "status" => status.to_string(),
    )
    .increment(1);

    histogram!("upstream_request_duration_seconds", "target" => target)
        .record(duration.as_secs_f64());
}
