//! Scope-level rollup of workload recommendations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tokio::task::JoinSet;
use tracing::debug;

use super::action::ActionSummary;
use super::summarizer::{NotificationsSummary, RecommendationSummary};
use crate::error::Result;
use crate::models::WorkloadRecommendations;

/// Cluster/namespace selection for a rollup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Cluster(String),
    Namespace(String),
    ClusterNamespace { cluster: String, namespace: String },
}

impl Scope {
    pub fn matches(&self, workload: &WorkloadRecommendations) -> bool {
        match self {
            Scope::Cluster(cluster) => workload.cluster_name == *cluster,
            Scope::Namespace(namespace) => workload.namespace == *namespace,
            Scope::ClusterNamespace { cluster, namespace } => {
                workload.cluster_name == *cluster && workload.namespace == *namespace
            }
        }
    }

    pub fn cluster_name(&self) -> Option<&str> {
        match self {
            Scope::Cluster(cluster) | Scope::ClusterNamespace { cluster, .. } => Some(cluster),
            Scope::Namespace(_) => None,
        }
    }

    /// Workload identity within this scope
    ///
    /// `namespace/name` for a cluster, `cluster/name` for a namespace and
    /// the bare name once both are fixed.
    pub fn workload_label(&self, workload: &WorkloadRecommendations) -> String {
        match self {
            Scope::Cluster(_) => format!("{}/{}", workload.namespace, workload.workload_name),
            Scope::Namespace(_) => format!("{}/{}", workload.cluster_name, workload.workload_name),
            Scope::ClusterNamespace { .. } => workload.workload_name.clone(),
        }
    }

    pub fn namespace_name(&self) -> Option<&str> {
        match self {
            Scope::Namespace(namespace) | Scope::ClusterNamespace { namespace, .. } => Some(namespace),
            Scope::Cluster(_) => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Cluster(cluster) => write!(f, "cluster={}", cluster),
            Scope::Namespace(namespace) => write!(f, "namespace={}", namespace),
            Scope::ClusterNamespace { cluster, namespace } => {
                write!(f, "cluster={},namespace={}", cluster, namespace)
            }
        }
    }
}

/// Distinct names with their count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSet {
    pub count: usize,
    pub names: BTreeSet<String>,
}

impl From<BTreeSet<String>> for NameSet {
    fn from(names: BTreeSet<String>) -> Self {
        Self {
            count: names.len(),
            names,
        }
    }
}

/// `timestamp → category → period → RecommendationSummary`
pub type SummaryTree =
    BTreeMap<DateTime<Utc>, BTreeMap<String, BTreeMap<String, RecommendationSummary>>>;

/// Rollup for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    pub notifications_summary: NotificationsSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads: Option<NameSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NameSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<NameSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<NameSet>,
    pub action_summary_top_level: ActionSummary,
    #[serde(default)]
    pub summary: SummaryTree,
}

/// `category → period → RecommendationSummary`
type PeriodSlots = BTreeMap<String, BTreeMap<String, RecommendationSummary>>;

/// Partial rollup state
///
/// Only the latest timestamp of each container contributes. Its summaries
/// are merged per `(category, period)`, so workloads computed at different
/// as-of times still add up. The merged slots are filed under the newest
/// timestamp seen. Accumulators built from disjoint workload slices can be
/// merged in any order; `finish` shapes the result for a scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupAccumulator {
    slots: PeriodSlots,
    latest: Option<DateTime<Utc>>,
    notifications: NotificationsSummary,
    action_top_level: ActionSummary,
    workloads: BTreeSet<String>,
    namespaces: BTreeSet<String>,
    clusters: BTreeSet<String>,
    containers: BTreeSet<String>,
}

impl RollupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the latest recommendations of one workload into the accumulator
    ///
    /// Workloads are identified by [`Scope::workload_label`], so equal
    /// names from different namespaces or clusters stay distinct.
    pub fn add_workload(&mut self, scope: &Scope, workload: &WorkloadRecommendations) {
        let label = scope.workload_label(workload);
        self.workloads.insert(label.clone());
        self.namespaces.insert(workload.namespace.clone());
        self.clusters.insert(workload.cluster_name.clone());

        for container in &workload.containers {
            self.containers
                .insert(format!("{}/{}", workload.workload_name, container.container_name));
            let Some((ts, categories)) = container.recommendations.iter().next_back() else {
                continue;
            };
            self.latest = self.latest.max(Some(*ts));
            for (category, periods) in categories {
                for (period, rec) in periods {
                    let summary = RecommendationSummary::from_recommendation(rec, &label);
                    self.notifications.add(&summary.notifications_summary);
                    self.action_top_level.merge(&summary.action_summary);
                    self.slots
                        .entry(category.clone())
                        .or_default()
                        .entry(period.clone())
                        .or_default()
                        .merge(&summary);
                }
            }
        }
    }

    pub fn merge(&mut self, other: &RollupAccumulator) {
        for (category, periods) in &other.slots {
            for (period, summary) in periods {
                self.slots
                    .entry(category.clone())
                    .or_default()
                    .entry(period.clone())
                    .or_default()
                    .merge(summary);
            }
        }
        self.latest = self.latest.max(other.latest);
        self.notifications.add(&other.notifications);
        self.action_top_level.merge(&other.action_top_level);
        self.workloads.extend(other.workloads.iter().cloned());
        self.namespaces.extend(other.namespaces.iter().cloned());
        self.clusters.extend(other.clusters.iter().cloned());
        self.containers.extend(other.containers.iter().cloned());
    }

    pub fn workload_count(&self) -> usize {
        self.workloads.len()
    }

    pub fn finish(self, scope: &Scope) -> SummarizeResult {
        let (namespaces, clusters, containers) = match scope {
            Scope::Cluster(_) => (Some(self.namespaces.into()), None, None),
            Scope::Namespace(_) => (None, Some(self.clusters.into()), None),
            Scope::ClusterNamespace { .. } => (None, None, Some(self.containers.into())),
        };
        let mut summary = SummaryTree::new();
        if let Some(latest) = self.latest {
            if !self.slots.is_empty() {
                summary.insert(latest, self.slots);
            }
        }
        SummarizeResult {
            cluster_name: scope.cluster_name().map(str::to_string),
            namespace_name: scope.namespace_name().map(str::to_string),
            notifications_summary: self.notifications,
            workloads: Some(self.workloads.into()),
            namespaces,
            clusters,
            containers,
            action_summary_top_level: self.action_top_level,
            summary,
        }
    }
}

/// Builds `SummarizeResult`s from workload recommendation objects
pub struct RollupAggregator;

impl RollupAggregator {
    pub fn summarize(scope: &Scope, workloads: &[WorkloadRecommendations]) -> SummarizeResult {
        let mut acc = RollupAccumulator::new();
        for workload in workloads.iter().filter(|w| scope.matches(w)) {
            acc.add_workload(scope, workload);
        }
        acc.finish(scope)
    }

    /// One blocking task per workload, partials folded on the caller
    ///
    /// Partials are folded in input order so the result is identical to
    /// [`RollupAggregator::summarize`].
    pub async fn summarize_concurrent(
        scope: &Scope,
        workloads: Vec<WorkloadRecommendations>,
    ) -> Result<SummarizeResult> {
        let mut tasks = JoinSet::new();
        for (idx, workload) in workloads.into_iter().enumerate() {
            if !scope.matches(&workload) {
                continue;
            }
            let scope = scope.clone();
            tasks.spawn_blocking(move || {
                let mut partial = RollupAccumulator::new();
                partial.add_workload(&scope, &workload);
                (idx, partial)
            });
        }

        let mut partials = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            partials.push(joined?);
        }
        partials.sort_by_key(|(idx, _)| *idx);
        debug!(scope = %scope, partials = partials.len(), "Folding rollup partials");

        let mut acc = RollupAccumulator::new();
        for (_, partial) in &partials {
            acc.merge(partial);
        }
        Ok(acc.finish(scope))
    }
}
