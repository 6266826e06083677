//! Read-through summarize orchestration
//!
//! Validates the request, clears the cache on fetch-fresh, serves cached
//! scopes, and otherwise loads workloads from the source, rolls them up and
//! repopulates the cache. A request without a name expands into one scope
//! per known cluster or namespace.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::error::{EngineError, Result};
use crate::health::{components, HealthRegistry};
use crate::models::WorkloadRecommendations;
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::source::{RecommendationFilter, WorkloadSource};
use crate::summary::{
    RollupAggregator, Scope, ScopeSelection, SummarizeQuery, SummarizeRequest, SummarizeResult,
    SummaryCache,
};

pub struct SummarizeService {
    source: Arc<dyn WorkloadSource>,
    cache: Arc<SummaryCache>,
    health: HealthRegistry,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl SummarizeService {
    pub fn new(
        source: Arc<dyn WorkloadSource>,
        cache: Arc<SummaryCache>,
        health: HealthRegistry,
        instance_name: &str,
    ) -> Self {
        Self {
            source,
            cache,
            health,
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new(instance_name),
        }
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    /// Validate raw query parameters and summarize
    pub async fn summarize(&self, query: &SummarizeQuery) -> Result<Vec<SummarizeResult>> {
        let request = query.validate()?;
        self.summarize_request(&request).await
    }

    pub async fn summarize_request(&self, request: &SummarizeRequest) -> Result<Vec<SummarizeResult>> {
        let selection = request.selection()?;

        if request.fetch_fresh {
            let dropped = self.cache.clear();
            self.metrics.inc_cache_clear();
            self.logger.log_cache_cleared(dropped);
        }

        if self.cache.is_poisoned() {
            warn!("Summary cache lock poisoned");
            self.health
                .set_degraded(
                    components::CACHE,
                    "summary cache lock poisoned, entries may be stale",
                )
                .await;
        } else if request.fetch_fresh {
            self.health.set_healthy(components::CACHE).await;
        }

        let known = match selection {
            ScopeSelection::One(_) => Vec::new(),
            ScopeSelection::AllClusters => self.source.cluster_names().await?,
            ScopeSelection::AllNamespaces => self.source.namespace_names().await?,
        };

        let mut results = Vec::new();
        for scope in selection.expand(known) {
            if let Some(result) = self.summarize_scope(&scope).await? {
                results.push(result);
            }
        }
        Ok(results)
    }

    async fn summarize_scope(&self, scope: &Scope) -> Result<Option<SummarizeResult>> {
        let started = Instant::now();

        let generation = if SummaryCache::is_cacheable(scope) {
            let lookup = self.cache.lookup(scope);
            if let Some(hit) = lookup.hit {
                self.metrics.inc_cache_hit();
                self.finish(scope, &hit, true, started);
                return Ok(Some(hit));
            }
            self.metrics.inc_cache_miss();
            Some(lookup.generation)
        } else {
            None
        };

        let workloads = match self.source.workloads(scope).await {
            Ok(workloads) => workloads,
            Err(EngineError::UpstreamDataUnavailable(_)) => {
                self.logger.log_no_data(scope);
                return Ok(None);
            }
            Err(err) => {
                error!(scope = %scope, error = %err, "Failed to load workloads");
                self.metrics.inc_summarize_errors();
                self.health
                    .set_unhealthy(components::SOURCE, err.to_string())
                    .await;
                return Err(err);
            }
        };

        let result = RollupAggregator::summarize_concurrent(scope, workloads).await?;
        if let Some(generation) = generation {
            if self.cache.insert(scope, result.clone(), generation) {
                debug!(scope = %scope, "Summary cached");
            }
        }
        self.finish(scope, &result, false, started);
        Ok(Some(result))
    }

    fn finish(&self, scope: &Scope, result: &SummarizeResult, cached: bool, started: Instant) {
        let workloads = result.workloads.as_ref().map(|w| w.count).unwrap_or(0);
        let elapsed = started.elapsed();
        self.metrics.observe_summarize_latency(elapsed.as_secs_f64());
        self.metrics.set_workloads_summarized(workloads as i64);
        self.logger
            .log_summary(scope, workloads, cached, elapsed.as_millis() as u64);
    }

    pub async fn recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> Result<Vec<WorkloadRecommendations>> {
        self.source.list_recommendations(filter).await
    }
}
