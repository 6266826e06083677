//! Workload recommendation sources
//!
//! The summarize service reads workloads through [`WorkloadSource`]. The
//! bundled [`InMemorySource`] holds a fixed set of workloads, loaded from a
//! JSON document of precomputed recommendations and/or raw interval
//! metrics that are run through the [`RecommendationComputer`].

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::models::{WorkloadMetrics, WorkloadRecommendations};
use crate::recommendation::RecommendationComputer;
use crate::summary::Scope;

/// Optional filters for listing recommendations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationFilter {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub namespace_name: Option<String>,
    #[serde(default)]
    pub workload_name: Option<String>,
}

impl RecommendationFilter {
    pub fn matches(&self, workload: &WorkloadRecommendations) -> bool {
        fn accepts(filter: &Option<String>, value: &str) -> bool {
            match filter.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(wanted) => wanted == value,
            }
        }
        accepts(&self.cluster_name, &workload.cluster_name)
            && accepts(&self.namespace_name, &workload.namespace)
            && accepts(&self.workload_name, &workload.workload_name)
    }
}

/// Datastore seam for workload recommendation objects
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// Every cluster with at least one workload
    async fn cluster_names(&self) -> Result<Vec<String>>;

    /// Every namespace with at least one workload
    async fn namespace_names(&self) -> Result<Vec<String>>;

    /// Workloads inside `scope`; `UpstreamDataUnavailable` when there are none
    async fn workloads(&self, scope: &Scope) -> Result<Vec<WorkloadRecommendations>>;

    async fn list_recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> Result<Vec<WorkloadRecommendations>>;
}

/// On-disk document accepted by [`InMemorySource::load_json`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    #[serde(default)]
    pub recommendations: Vec<WorkloadRecommendations>,
    #[serde(default)]
    pub metrics: Vec<WorkloadMetrics>,
    /// As-of timestamp for computing `metrics`; defaults to each container's latest interval
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Fixed in-memory set of workloads
#[derive(Debug, Default)]
pub struct InMemorySource {
    workloads: Vec<WorkloadRecommendations>,
    loads: AtomicUsize,
}

impl InMemorySource {
    pub fn new(workloads: Vec<WorkloadRecommendations>) -> Result<Self> {
        for workload in &workloads {
            workload.validate()?;
        }
        Ok(Self {
            workloads,
            loads: AtomicUsize::new(0),
        })
    }

    /// Compute recommendations from raw interval data
    pub fn from_metrics(
        metrics: &[WorkloadMetrics],
        computer: &RecommendationComputer,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let workloads = metrics
            .iter()
            .map(|w| computer.compute_workload(w, as_of))
            .collect();
        Self::new(workloads)
    }

    pub fn from_document(doc: SourceDocument, computer: &RecommendationComputer) -> Result<Self> {
        let mut workloads = doc.recommendations;
        workloads.extend(
            doc.metrics
                .iter()
                .map(|w| computer.compute_workload(w, doc.as_of)),
        );
        Self::new(workloads)
    }

    pub async fn load_json(
        path: impl AsRef<Path>,
        computer: &RecommendationComputer,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read workload data from {}", path.display()))?;
        let doc: SourceDocument = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Source(e.to_string()))
            .with_context(|| format!("Failed to parse workload data in {}", path.display()))?;

        let precomputed = doc.recommendations.len();
        let computed = doc.metrics.len();
        let source = Self::from_document(doc, computer)
            .with_context(|| format!("Invalid workload data in {}", path.display()))?;

        info!(
            path = %path.display(),
            precomputed,
            computed,
            "Workload source loaded"
        );
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    /// Number of scope loads served so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn distinct<'a>(&'a self, key: impl Fn(&'a WorkloadRecommendations) -> &'a str) -> Vec<String> {
        self.workloads
            .iter()
            .map(key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl WorkloadSource for InMemorySource {
    async fn cluster_names(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|w| w.cluster_name.as_str()))
    }

    async fn namespace_names(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|w| w.namespace.as_str()))
    }

    async fn workloads(&self, scope: &Scope) -> Result<Vec<WorkloadRecommendations>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let matching: Vec<WorkloadRecommendations> = self
            .workloads
            .iter()
            .filter(|w| scope.matches(w))
            .cloned()
            .collect();
        debug!(scope = %scope, workloads = matching.len(), "Loaded workloads for scope");
        if matching.is_empty() {
            return Err(EngineError::UpstreamDataUnavailable(scope.to_string()));
        }
        Ok(matching)
    }

    async fn list_recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> Result<Vec<WorkloadRecommendations>> {
        Ok(self
            .workloads
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }
}
