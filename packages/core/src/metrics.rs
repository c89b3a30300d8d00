//! Prometheus metrics registry for the medicine tracker.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the scheduler, the resolver and the HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry,
};

use crate::expiry::SweepReport;

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Total number of expiry sweeps (success + failure).
    pub sweeps_total: Counter,
    /// Sweeps that aborted on a persistence failure.
    pub sweep_errors_total: Counter,
    /// Alerts created, labelled by bucket.
    pub alerts_created_total: CounterVec,
    /// Barcode resolutions, labelled by source (`persisted`, `cache`,
    /// `external`, `not_found`).
    pub lookups_total: CounterVec,
    /// Provider calls that failed or timed out, labelled by provider.
    pub provider_failures_total: CounterVec,
    /// Current number of entries in the lookup cache.
    pub lookup_cache_entries: Gauge,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sweeps_total = Counter::with_opts(Opts::new(
            "medicine_tracker_sweeps_total",
            "Total expiry sweeps",
        ))?;

        let sweep_errors_total = Counter::with_opts(Opts::new(
            "medicine_tracker_sweep_errors_total",
            "Expiry sweeps aborted by a persistence failure",
        ))?;

        let alerts_created_total = CounterVec::new(
            Opts::new(
                "medicine_tracker_alerts_created_total",
                "Expiry alerts created by bucket",
            ),
            &["bucket"],
        )?;

        let lookups_total = CounterVec::new(
            Opts::new(
                "medicine_tracker_lookups_total",
                "Barcode resolutions by source",
            ),
            &["source"],
        )?;

        let provider_failures_total = CounterVec::new(
            Opts::new(
                "medicine_tracker_provider_failures_total",
                "Failed or timed out provider calls by provider",
            ),
            &["provider"],
        )?;

        let lookup_cache_entries = Gauge::with_opts(Opts::new(
            "medicine_tracker_lookup_cache_entries",
            "Current size of the lookup cache",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "medicine_tracker_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "medicine_tracker_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        registry.register(Box::new(sweeps_total.clone()))?;
        registry.register(Box::new(sweep_errors_total.clone()))?;
        registry.register(Box::new(alerts_created_total.clone()))?;
        registry.register(Box::new(lookups_total.clone()))?;
        registry.register(Box::new(provider_failures_total.clone()))?;
        registry.register(Box::new(lookup_cache_entries.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            sweeps_total,
            sweep_errors_total,
            alerts_created_total,
            lookups_total,
            provider_failures_total,
            lookup_cache_entries,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Count a sweep and the alerts it created.
    ///
    /// Also used for the partial report of a failed sweep, since the alerts
    /// it wrote before aborting stay written.
    pub fn record_sweep(&self, report: &SweepReport) {
        self.sweeps_total.inc();
        for (bucket, count) in &report.per_bucket {
            if *count > 0 {
                self.alerts_created_total
                    .with_label_values(&[bucket.as_str()])
                    .inc_by(*count as f64);
            }
        }
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
