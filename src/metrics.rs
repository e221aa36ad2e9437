//! Crawl observability metrics
//!
//! Archive requests, checkpoint writes, rate-limit waits and the crawl
//! frontier are exported through the `metrics` facade. Installing the
//! Prometheus exporter is optional; without it every recording call is a no-op.

use crate::MonthUnit;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without rebinding.
///
/// # Arguments
/// * `addr` - Socket address to bind the scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "archive_requests_total",
        Unit::Count,
        "Total number of archive API requests by outcome"
    );

    describe_histogram!(
        "archive_request_duration_seconds",
        Unit::Seconds,
        "Archive API request duration in seconds"
    );

    describe_counter!(
        "checkpoints_written_total",
        Unit::Count,
        "Total number of month checkpoints written, by crawl direction"
    );

    describe_counter!(
        "records_written_total",
        Unit::Count,
        "Total number of article records written to checkpoints"
    );

    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for the archive rate limit"
    );

    describe_gauge!(
        "crawl_frontier_newest",
        Unit::Count,
        "Newest checkpointed month as YYYYMM"
    );

    describe_gauge!(
        "crawl_frontier_oldest",
        Unit::Count,
        "Oldest checkpointed month as YYYYMM"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Timing and outcome of one archive request
pub struct ArchiveRequestMetrics {
    unit: MonthUnit,
    start_time: Instant,
}

impl ArchiveRequestMetrics {
    /// Start recording a request for `unit`
    pub fn start(unit: MonthUnit) -> Self {
        Self {
            unit,
            start_time: Instant::now(),
        }
    }

    /// Record a request that produced an HTTP status
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "archive_requests_total",
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!("archive_request_duration_seconds").record(duration.as_secs_f64());

        if status_code == 429 {
            warn!(
                unit = %self.unit,
                duration_ms = duration.as_millis(),
                "Archive API rejected request with 429; consider a longer rate limit"
            );
        }

        debug!(
            unit = %self.unit,
            status = status_code,
            duration_ms = duration.as_millis(),
            "Archive request completed"
        );
    }

    /// Record a request that failed before a status was received
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "archive_requests_total",
            "status" => "network_error",
        )
        .increment(1);

        histogram!("archive_request_duration_seconds").record(duration.as_secs_f64());

        warn!(
            unit = %self.unit,
            duration_ms = duration.as_millis(),
            "Archive request network error recorded"
        );
    }
}

/// Record a checkpoint written by the scheduler
pub fn record_checkpoint_written(direction: &'static str, records: usize) {
    counter!("checkpoints_written_total", "direction" => direction).increment(1);
    counter!("records_written_total").increment(records as u64);
}

/// Record time spent blocked on the rate limiter
pub fn record_rate_limit_wait(waited: Duration) {
    histogram!("rate_limit_wait_seconds").record(waited.as_secs_f64());
}

/// Publish the current frontier
pub fn record_frontier(newest: Option<MonthUnit>, oldest: Option<MonthUnit>) {
    if let Some(newest) = newest {
        gauge!("crawl_frontier_newest").set(newest.as_number() as f64);
    }
    if let Some(oldest) = oldest {
        gauge!("crawl_frontier_oldest").set(oldest.as_number() as f64);
    }
}
