//! Core data models for the recommendation engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{EngineError, Result};
use crate::notification::{NotificationCode, RecommendationNotification};

/// Recommendation category produced by the duration-windowed computer
pub const DURATION_BASED: &str = "duration_based";

/// Metrics tracked for every interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    CpuRequest,
    CpuLimit,
    CpuUsage,
    CpuThrottle,
    MemoryRequest,
    MemoryLimit,
    MemoryUsage,
    #[serde(rename = "memoryRSS")]
    MemoryRss,
}

/// One metric aggregated over one interval
///
/// The format is a unit tag carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl MetricAggregate {
    /// Non-empty format tag, if any
    pub fn unit(&self) -> Option<&str> {
        self.format.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// Aggregated metrics for one collection interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalResult {
    pub interval_start: DateTime<Utc>,
    pub interval_end: DateTime<Utc>,
    pub duration_in_minutes: f64,
    #[serde(default)]
    pub metrics: HashMap<MetricName, MetricAggregate>,
}

impl IntervalResult {
    pub fn metric(&self, name: MetricName) -> Option<&MetricAggregate> {
        self.metrics.get(&name)
    }
}

/// Historical interval data for one container, keyed by interval end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerData {
    pub container_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    #[serde(default)]
    pub results: BTreeMap<DateTime<Utc>, IntervalResult>,
}

impl ContainerData {
    pub fn new(
        container_name: impl Into<String>,
        results: impl IntoIterator<Item = IntervalResult>,
    ) -> Self {
        Self {
            container_name: container_name.into(),
            container_image: None,
            results: results
                .into_iter()
                .map(|r| (r.interval_end, r))
                .collect(),
        }
    }

    /// Latest interval end, the default as-of timestamp
    pub fn latest_end(&self) -> Option<DateTime<Utc>> {
        self.results.keys().next_back().copied()
    }

    /// Earliest interval start across all intervals
    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        self.results.values().map(|r| r.interval_start).min()
    }
}

/// Raw interval data for every container of one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadMetrics {
    pub cluster_name: String,
    pub namespace: String,
    pub workload_name: String,
    #[serde(default = "default_workload_type")]
    pub workload_type: String,
    #[serde(default)]
    pub containers: Vec<ContainerData>,
}

fn default_workload_type() -> String {
    "deployment".to_string()
}

/// A named historical window, e.g. `medium_term` over 7 days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationSubCategory {
    pub name: String,
    pub length_in_days: u32,
}

impl DurationSubCategory {
    pub fn new(name: impl Into<String>, length_in_days: u32) -> Self {
        Self {
            name: name.into(),
            length_in_days,
        }
    }

    /// Short, medium and long term windows
    pub fn default_set() -> Vec<DurationSubCategory> {
        vec![
            DurationSubCategory::new("short_term", 1),
            DurationSubCategory::new("medium_term", 7),
            DurationSubCategory::new("long_term", 15),
        ]
    }

    /// Parse `name:days,name:days`
    pub fn parse_list(raw: &str) -> Result<Vec<DurationSubCategory>> {
        let mut parsed = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, days) = entry.split_once(':').ok_or_else(|| {
                EngineError::InvalidConfiguration(format!(
                    "sub-category `{}` must be written as name:days",
                    entry
                ))
            })?;
            let days: u32 = days.trim().parse().map_err(|_| {
                EngineError::InvalidConfiguration(format!(
                    "sub-category `{}` has a non-numeric day count",
                    entry
                ))
            })?;
            if days == 0 {
                return Err(EngineError::InvalidConfiguration(format!(
                    "sub-category `{}` must span at least one day",
                    entry
                )));
            }
            parsed.push(DurationSubCategory::new(name.trim(), days));
        }
        if parsed.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "at least one sub-category is required".to_string(),
            ));
        }
        Ok(parsed)
    }
}

/// Requests or limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSetting {
    Requests,
    Limits,
}

/// CPU or memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    pub fn default_format(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cores",
            ResourceKind::Memory => "MiB",
        }
    }
}

pub const SETTINGS: [ResourceSetting; 2] = [ResourceSetting::Requests, ResourceSetting::Limits];
pub const RESOURCES: [ResourceKind; 2] = [ResourceKind::Cpu, ResourceKind::Memory];

/// A single recommended (or current) amount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationConfigItem {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl RecommendationConfigItem {
    pub fn new(amount: f64, format: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            format: Some(format.into()),
            error_msg: None,
        }
    }

    /// An item whose computation failed
    pub fn failed(error: &EngineError, format: Option<String>) -> Self {
        Self {
            amount: None,
            format,
            error_msg: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_msg.is_some()
    }
}

/// `{requests, limits} × {cpu, memory}` grid of config items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationConfig(
    pub BTreeMap<ResourceSetting, BTreeMap<ResourceKind, RecommendationConfigItem>>,
);

impl RecommendationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, setting: ResourceSetting, kind: ResourceKind) -> Option<&RecommendationConfigItem> {
        self.0.get(&setting).and_then(|items| items.get(&kind))
    }

    pub fn amount(&self, setting: ResourceSetting, kind: ResourceKind) -> Option<f64> {
        self.get(setting, kind).and_then(|item| item.amount)
    }

    pub fn set(&mut self, setting: ResourceSetting, kind: ResourceKind, item: RecommendationConfigItem) {
        self.0.entry(setting).or_default().insert(kind, item);
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (ResourceSetting, ResourceKind, &RecommendationConfigItem)> {
        self.0.iter().flat_map(|(setting, items)| {
            items.iter().map(move |(kind, item)| (*setting, *kind, item))
        })
    }

    /// Keep only the items matching `keep`
    pub fn filtered(&self, keep: impl Fn(&RecommendationConfigItem) -> bool) -> Self {
        let mut out = RecommendationConfig::new();
        for (setting, kind, item) in self.iter() {
            if keep(item) {
                out.set(setting, kind, item.clone());
            }
        }
        out
    }

    /// Sum `other` into `self` item by item
    ///
    /// Amounts add; when formats disagree the lexicographically smaller tag
    /// wins so that the operation stays order independent.
    pub fn add(&mut self, other: &RecommendationConfig) {
        for (setting, kind, theirs) in other.iter() {
            let slot = self.0.entry(setting).or_default().entry(kind).or_default();
            slot.amount = match (slot.amount, theirs.amount) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
            slot.format = min_option(slot.format.take(), theirs.format.clone());
            slot.error_msg = min_option(slot.error_msg.take(), theirs.error_msg.clone());
        }
    }
}

fn min_option(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Sizing for one container, one sub-category, one as-of timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_start_time: Option<DateTime<Utc>>,
    pub monitoring_end_time: DateTime<Utc>,
    #[serde(default)]
    pub duration_in_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RecommendationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_config: Option<RecommendationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<RecommendationConfig>,
    #[serde(default)]
    pub notifications: BTreeMap<NotificationCode, RecommendationNotification>,
}

impl Recommendation {
    /// A recommendation that could not be produced for lack of history
    pub fn not_enough_data(monitoring_end_time: DateTime<Utc>) -> Self {
        let mut rec = Self {
            monitoring_start_time: None,
            monitoring_end_time,
            duration_in_hours: 0.0,
            config: None,
            current_config: None,
            variation: None,
            notifications: BTreeMap::new(),
        };
        rec.notify(NotificationCode::InfoNotEnoughData);
        rec
    }

    pub fn notify(&mut self, code: NotificationCode) {
        self.notifications
            .insert(code, RecommendationNotification::new(code));
    }

    pub fn has_notification(&self, code: NotificationCode) -> bool {
        self.notifications.contains_key(&code)
    }

    /// Check required fields on recommendations coming from outside the engine
    pub fn validate(&self) -> Result<()> {
        if !self.duration_in_hours.is_finite() {
            return Err(EngineError::MissingField {
                entity: "recommendation",
                field: "durationInHours",
            });
        }
        if self.config.is_none() && self.notifications.is_empty() {
            return Err(EngineError::MissingField {
                entity: "recommendation",
                field: "config",
            });
        }
        Ok(())
    }
}

/// `timestamp → category → period → Recommendation`
pub type RecommendationTree =
    BTreeMap<DateTime<Utc>, BTreeMap<String, BTreeMap<String, Recommendation>>>;

/// Recommendations for one container of a workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecommendations {
    pub container_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    #[serde(default)]
    pub recommendations: RecommendationTree,
}

impl ContainerRecommendations {
    /// Iterate every `(timestamp, category, period, recommendation)` entry
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (&DateTime<Utc>, &String, &String, &Recommendation)> {
        self.recommendations.iter().flat_map(|(ts, categories)| {
            categories.iter().flat_map(move |(category, periods)| {
                periods
                    .iter()
                    .map(move |(period, rec)| (ts, category, period, rec))
            })
        })
    }
}

/// Per-workload recommendation object consumed by the rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRecommendations {
    pub cluster_name: String,
    pub namespace: String,
    pub workload_name: String,
    #[serde(default = "default_workload_type")]
    pub workload_type: String,
    #[serde(default)]
    pub containers: Vec<ContainerRecommendations>,
}

impl WorkloadRecommendations {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("clusterName", &self.cluster_name),
            ("namespace", &self.namespace),
            ("workloadName", &self.workload_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EngineError::MissingField {
                    entity: "workload",
                    field,
                });
            }
        }
        for container in &self.containers {
            if container.container_name.trim().is_empty() {
                return Err(EngineError::MissingField {
                    entity: "container",
                    field: "containerName",
                });
            }
            for (_, _, _, rec) in container.entries() {
                rec.validate()?;
            }
        }
        Ok(())
    }
}
