//! Action buckets with affected workload sets

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::notification::{ActionBucket, ActionResource};

/// Workloads sorted into one `(bucket, resource)` cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub count: usize,
    pub workload_names: BTreeSet<String>,
}

impl ResourceInfo {
    fn insert(&mut self, workload_name: &str) {
        self.workload_names.insert(workload_name.to_string());
        self.count = self.workload_names.len();
    }

    fn union(&mut self, other: &ResourceInfo) {
        self.workload_names
            .extend(other.workload_names.iter().cloned());
        self.count = self.workload_names.len();
    }
}

/// `bucket → resource → ResourceInfo`
///
/// Counts are always the size of the name set, so merging the same
/// workload twice never double counts. The `total` bucket of a resource is
/// the union of its other buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSummary(pub BTreeMap<ActionBucket, BTreeMap<ActionResource, ResourceInfo>>);

impl ActionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, bucket: ActionBucket, resource: ActionResource, workload_name: &str) {
        self.slot(bucket, resource).insert(workload_name);
        if bucket != ActionBucket::Total {
            self.slot(ActionBucket::Total, resource).insert(workload_name);
        }
    }

    pub fn get(&self, bucket: ActionBucket, resource: ActionResource) -> Option<&ResourceInfo> {
        self.0.get(&bucket).and_then(|r| r.get(&resource))
    }

    pub fn count(&self, bucket: ActionBucket, resource: ActionResource) -> usize {
        self.get(bucket, resource).map(|info| info.count).unwrap_or(0)
    }

    /// Whether any non-total bucket holds a workload for `resource`
    pub fn has_assignment(&self, resource: ActionResource) -> bool {
        self.0
            .iter()
            .filter(|(bucket, _)| **bucket != ActionBucket::Total)
            .any(|(_, resources)| {
                resources
                    .get(&resource)
                    .map(|info| info.count > 0)
                    .unwrap_or(false)
            })
    }

    /// Union `other` into `self` cell by cell
    pub fn merge(&mut self, other: &ActionSummary) {
        for (bucket, resources) in &other.0 {
            if *bucket == ActionBucket::Total {
                continue;
            }
            for (resource, info) in resources {
                self.slot(*bucket, *resource).union(info);
            }
        }
        self.refresh_totals();
    }

    pub fn is_empty(&self) -> bool {
        self.0
            .values()
            .all(|resources| resources.values().all(|info| info.count == 0))
    }

    fn slot(&mut self, bucket: ActionBucket, resource: ActionResource) -> &mut ResourceInfo {
        self.0.entry(bucket).or_default().entry(resource).or_default()
    }

    fn refresh_totals(&mut self) {
        let mut totals: BTreeMap<ActionResource, ResourceInfo> = BTreeMap::new();
        for (bucket, resources) in &self.0 {
            if *bucket == ActionBucket::Total {
                continue;
            }
            for (resource, info) in resources {
                totals.entry(*resource).or_default().union(info);
            }
        }
        if totals.is_empty() {
            self.0.remove(&ActionBucket::Total);
        } else {
            self.0.insert(ActionBucket::Total, totals);
        }
    }
}
