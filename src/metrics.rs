//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub mint_attempts: IntCounter,
    pub mint_success: IntCounter,
    /// Failed mints by error category
    pub mint_failed: IntCounterVec,
    pub validation_failures: IntCounter,
    pub signature_rejections: IntCounter,
    pub confirm_retries: IntCounter,
    /// Store failures after a confirmed mint, by store error category
    pub persist_failures: IntCounterVec,
    pub balance_anomalies: IntCounter,

    // Histograms
    pub mint_latency: Histogram,
    pub confirm_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let mint_attempts = IntCounter::with_opts(Opts::new(
            "mint_attempts_total",
            "Total number of token mints attempted",
        ))?;

        let mint_success =
            IntCounter::with_opts(Opts::new("mint_success_total", "Number of confirmed mints"))?;

        let mint_failed = IntCounterVec::new(
            Opts::new("mint_failed_total", "Number of failed mints"),
            &["category"],
        )?;

        let validation_failures = IntCounter::with_opts(Opts::new(
            "mint_validation_failures_total",
            "Mints rejected before any network call",
        ))?;

        let signature_rejections = IntCounter::with_opts(Opts::new(
            "wallet_signature_rejections_total",
            "Signature requests declined by the wallet",
        ))?;

        let confirm_retries = IntCounter::with_opts(Opts::new(
            "confirm_retries_total",
            "Confirmation retries after checkpoint expiry",
        ))?;

        let persist_failures = IntCounterVec::new(
            Opts::new(
                "token_persist_failures_total",
                "Confirmed mints whose record could not be stored",
            ),
            &["category"],
        )?;

        let balance_anomalies = IntCounter::with_opts(Opts::new(
            "balance_anomalies_total",
            "Receipts where the balance delta did not cover the service fee",
        ))?;

        let mint_latency = Histogram::with_opts(
            HistogramOpts::new("mint_latency_seconds", "End-to-end mint latency")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        let confirm_latency = Histogram::with_opts(
            HistogramOpts::new("confirm_latency_seconds", "Submission to terminal status")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(mint_attempts.clone()))?;
        registry.register(Box::new(mint_success.clone()))?;
        registry.register(Box::new(mint_failed.clone()))?;
        registry.register(Box::new(validation_failures.clone()))?;
        registry.register(Box::new(signature_rejections.clone()))?;
        registry.register(Box::new(confirm_retries.clone()))?;
        registry.register(Box::new(persist_failures.clone()))?;
        registry.register(Box::new(balance_anomalies.clone()))?;
        registry.register(Box::new(mint_latency.clone()))?;
        registry.register(Box::new(confirm_latency.clone()))?;

        Ok(Self {
            registry,
            mint_attempts,
            mint_success,
            mint_failed,
            validation_failures,
            signature_rejections,
            confirm_retries,
            persist_failures,
            balance_anomalies,
            mint_latency,
            confirm_latency,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.start.elapsed().as_secs_f64());
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
