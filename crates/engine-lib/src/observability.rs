//! Observability for the recommendation engine
//!
//! Provides:
//! - Prometheus metrics (summarize and recommendation latency, cache traffic, data coverage)
//! - Structured event logging with tracing

use prometheus::{register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::summary::Scope;

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    summarize_latency_seconds: Histogram,
    recommendation_latency_seconds: Histogram,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    cache_clears: IntCounter,
    recommendations_computed: IntCounter,
    insufficient_data: IntCounter,
    workloads_summarized: IntGauge,
    summarize_errors: IntCounter,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            summarize_latency_seconds: register_histogram!(
                "rightsizer_summarize_latency_seconds",
                "Time spent producing one scope summary, cache hits included",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register summarize_latency_seconds"),

            recommendation_latency_seconds: register_histogram!(
                "rightsizer_recommendation_latency_seconds",
                "Time spent computing recommendations for one workload",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register recommendation_latency_seconds"),

            cache_hits: register_int_counter!(
                "rightsizer_summary_cache_hits_total",
                "Summaries served from the cache"
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_counter!(
                "rightsizer_summary_cache_misses_total",
                "Cacheable summaries that had to be recomputed"
            )
            .expect("Failed to register cache_misses"),

            cache_clears: register_int_counter!(
                "rightsizer_summary_cache_clears_total",
                "Fetch-fresh requests that cleared the summary cache"
            )
            .expect("Failed to register cache_clears"),

            recommendations_computed: register_int_counter!(
                "rightsizer_recommendations_computed_total",
                "Per-period recommendations produced by the computer"
            )
            .expect("Failed to register recommendations_computed"),

            insufficient_data: register_int_counter!(
                "rightsizer_insufficient_data_total",
                "Per-period recommendations skipped for lack of history"
            )
            .expect("Failed to register insufficient_data"),

            workloads_summarized: register_int_gauge!(
                "rightsizer_workloads_summarized",
                "Workloads covered by the most recent summary"
            )
            .expect("Failed to register workloads_summarized"),

            summarize_errors: register_int_counter!(
                "rightsizer_summarize_errors_total",
                "Summarize requests that failed"
            )
            .expect("Failed to register summarize_errors"),
        }
    }
}

/// Handle to the process-wide engine metrics
///
/// Clones share the same collectors.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_summarize_latency(&self, duration_secs: f64) {
        self.inner().summarize_latency_seconds.observe(duration_secs);
    }

    pub fn observe_recommendation_latency(&self, duration_secs: f64) {
        self.inner().recommendation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_cache_hit(&self) {
        self.inner().cache_hits.inc();
    }

    pub fn inc_cache_miss(&self) {
        self.inner().cache_misses.inc();
    }

    pub fn inc_cache_clear(&self) {
        self.inner().cache_clears.inc();
    }

    /// Record one computed period, flagging those without enough history
    pub fn record_recommendation(&self, insufficient: bool) {
        if insufficient {
            self.inner().insufficient_data.inc();
        } else {
            self.inner().recommendations_computed.inc();
        }
    }

    pub fn set_workloads_summarized(&self, count: i64) {
        self.inner().workloads_summarized.set(count);
    }

    pub fn inc_summarize_errors(&self) {
        self.inner().summarize_errors.inc();
    }
}

/// Event-style logging for significant engine events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_summary(&self, scope: &Scope, workloads: usize, cached: bool, elapsed_ms: u64) {
        info!(
            event = "summary_computed",
            instance = %self.instance,
            scope = %scope,
            workloads = workloads,
            cached = cached,
            elapsed_ms = elapsed_ms,
            "Scope summary ready"
        );
    }

    pub fn log_cache_cleared(&self, dropped: usize) {
        info!(
            event = "cache_cleared",
            instance = %self.instance,
            dropped_entries = dropped,
            "Summary cache cleared by fetch-fresh request"
        );
    }

    pub fn log_no_data(&self, scope: &Scope) {
        warn!(
            event = "no_data",
            instance = %self.instance,
            scope = %scope,
            "No workload data for scope"
        );
    }

    pub fn log_source_loaded(&self, source: &str, workloads: usize) {
        info!(
            event = "source_loaded",
            instance = %self.instance,
            source = %source,
            workloads = workloads,
            "Workload source ready"
        );
    }

    pub fn log_startup(&self, version: &str, sub_categories: &str) {
        info!(
            event = "engine_started",
            instance = %self.instance,
            version = %version,
            sub_categories = %sub_categories,
            "Rightsizer started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "engine_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Rightsizer shutting down"
        );
    }
}
