//! Prometheus counters for update outcomes, shared by all jobs and the
//! exposition endpoint.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome counters consumed by the job pipeline. Exactly one of the two is
/// recorded per invocation, on every exit path; an unchanged source counts
/// as a success.
pub trait MetricsSink: Send + Sync {
    fn record_success(&self, job: &str, file: &str);
    fn record_error(&self, job: &str, file: &str);
}

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    success: IntCounterVec,
    error: IntCounterVec,
    success_total: IntCounter,
    error_total: IntCounter,
}

/// Point-in-time totals, used by tests and health reporting.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub success_total: u64,
    pub error_total: u64,
}

impl Metrics {
    /// Construct the registry with the four update counters registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let success = IntCounterVec::new(
            Opts::new(
                "crl_updater_success",
                "Number of successful CRL update attempts per job.",
            ),
            &["job", "file"],
        )?;
        let error = IntCounterVec::new(
            Opts::new(
                "crl_updater_error",
                "Number of unsuccessful CRL update attempts per job.",
            ),
            &["job", "file"],
        )?;
        let success_total = IntCounter::with_opts(Opts::new(
            "crl_updater_success_total",
            "Number of successful CRL update attempts.",
        ))?;
        let error_total = IntCounter::with_opts(Opts::new(
            "crl_updater_error_total",
            "Number of unsuccessful CRL update attempts.",
        ))?;

        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(error.clone()))?;
        registry.register(Box::new(success_total.clone()))?;
        registry.register(Box::new(error_total.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                success,
                error,
                success_total,
                error_total,
            }),
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            success_total: self.inner.success_total.get(),
            error_total: self.inner.error_total.get(),
        }
    }
}

impl MetricsSink for Metrics {
    fn record_success(&self, job: &str, file: &str) {
        self.inner.success.with_label_values(&[job, file]).inc();
        self.inner.success_total.inc();
    }

    fn record_error(&self, job: &str, file: &str) {
        self.inner.error.with_label_values(&[job, file]).inc();
        self.inner.error_total.inc();
    }
}
