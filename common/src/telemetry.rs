// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

/// Initialize structured logging with JSON formatting
///
/// Log levels come from `RUST_LOG` when set, otherwise from configuration.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        "Structured logging initialized with JSON formatting"
    );

    Ok(())
}

/// Initialize Prometheus metrics exporter and register all metrics:
/// - job_submitted_total: Counter for submitted jobs
/// - job_success_total: Counter for jobs that finished Done
/// - job_failed_total: Counter for jobs that finished Failed
/// - job_duration_seconds: Histogram for end-to-end job duration
/// - jobs_in_flight: Gauge for jobs currently running
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!("job_submitted_total", "Total number of submitted jobs");
    describe_counter!("job_success_total", "Total number of jobs that finished Done");
    describe_counter!("job_failed_total", "Total number of jobs that finished Failed");
    describe_histogram!(
        "job_duration_seconds",
        "End-to-end duration of jobs in seconds"
    );
    describe_gauge!("jobs_in_flight", "Number of jobs currently running");

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record a job submission
#[inline]
pub fn record_job_submitted(mode: &str) {
    counter!("job_submitted_total", "mode" => mode.to_string()).increment(1);
    gauge!("jobs_in_flight").increment(1.0);
}

/// Record a job that finished Done
#[inline]
pub fn record_job_success(job_id: &Uuid) {
    counter!("job_success_total", "job_id" => job_id.to_string()).increment(1);
    gauge!("jobs_in_flight").decrement(1.0);
}

/// Record a job that finished Failed
#[inline]
pub fn record_job_failure(job_id: &Uuid, reason: &str) {
    counter!(
        "job_failed_total",
        "job_id" => job_id.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
    gauge!("jobs_in_flight").decrement(1.0);
}

/// Record end-to-end job duration
#[inline]
pub fn record_job_duration(job_id: &Uuid, duration_seconds: f64) {
    histogram!("job_duration_seconds", "job_id" => job_id.to_string())
        .record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_with_valid_level() {
        let result = init_logging("info");
        // Either succeeds or the subscriber is already installed
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_metrics_recording() {
        // Recording without an installed exporter must not panic
        let job_id = Uuid::new_v4();
        record_job_submitted("in_memory");
        record_job_success(&job_id);
        record_job_failure(&job_id, "script");
        record_job_duration(&job_id, 1.5);
    }
}
