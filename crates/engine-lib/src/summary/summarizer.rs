//! Per-recommendation summaries and their merge

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::action::ActionSummary;
use crate::models::{Recommendation, RecommendationConfig};
use crate::notification::{classify_actions, RecommendationNotification, Severity};

/// Severity counters, additive across merges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsSummary {
    pub info: u64,
    pub notice: u64,
    pub warning: u64,
    pub error: u64,
    pub critical: u64,
}

impl NotificationsSummary {
    pub fn from_notifications<'a>(
        notifications: impl IntoIterator<Item = &'a RecommendationNotification>,
    ) -> Self {
        let mut summary = Self::default();
        for n in notifications {
            summary.bump(n.severity);
        }
        summary
    }

    pub fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Notice => self.notice += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn add(&mut self, other: &NotificationsSummary) {
        self.info += other.info;
        self.notice += other.notice;
        self.warning += other.warning;
        self.error += other.error;
        self.critical += other.critical;
    }

    pub fn total(&self) -> u64 {
        self.info + self.notice + self.warning + self.error + self.critical
    }
}

/// Partition of the variation map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Increase,
    Decrease,
    Variation,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Increase, ChangeKind::Decrease, ChangeKind::Variation];
}

/// Summable view of one recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub current_config: RecommendationConfig,
    pub config: RecommendationConfig,
    pub change: BTreeMap<ChangeKind, RecommendationConfig>,
    pub notifications_summary: NotificationsSummary,
    pub action_summary: ActionSummary,
}

impl Default for RecommendationSummary {
    fn default() -> Self {
        Self {
            current_config: RecommendationConfig::new(),
            config: RecommendationConfig::new(),
            change: ChangeKind::ALL
                .iter()
                .map(|kind| (*kind, RecommendationConfig::new()))
                .collect(),
            notifications_summary: NotificationsSummary::default(),
            action_summary: ActionSummary::new(),
        }
    }
}

fn strip_errors(config: &RecommendationConfig) -> RecommendationConfig {
    let mut out = RecommendationConfig::new();
    for (setting, kind, item) in config.iter() {
        out.set(setting, kind, item.without_error());
    }
    out
}

impl RecommendationSummary {
    /// Summarize one recommendation on behalf of `workload_name`
    pub fn from_recommendation(rec: &Recommendation, workload_name: &str) -> Self {
        let defaulted = rec.with_defaults();
        let config = strip_errors(defaulted.config.as_ref().unwrap_or(&RecommendationConfig::new()));
        let current_config =
            strip_errors(defaulted.current_config.as_ref().unwrap_or(&RecommendationConfig::new()));
        let variation = strip_errors(defaulted.variation.as_ref().unwrap_or(&RecommendationConfig::new()));

        let positive = |amount: Option<f64>| amount.map(|a| a > 0.0).unwrap_or(false);
        let negative = |amount: Option<f64>| amount.map(|a| a < 0.0).unwrap_or(false);

        let mut change = BTreeMap::new();
        change.insert(ChangeKind::Increase, variation.filtered(|item| positive(item.amount)));
        change.insert(ChangeKind::Decrease, variation.filtered(|item| negative(item.amount)));
        change.insert(ChangeKind::Variation, variation);

        Self {
            action_summary: classify_actions(&rec.notifications, &config, workload_name),
            notifications_summary: NotificationsSummary::from_notifications(rec.notifications.values()),
            current_config,
            config,
            change,
        }
    }

    /// Fold `other` into `self`
    ///
    /// Config amounts are summed, severity counters added and action sets
    /// unioned. Commutative and associative.
    pub fn merge(&mut self, other: &RecommendationSummary) {
        self.config.add(&other.config);
        self.current_config.add(&other.current_config);
        for (kind, config) in &other.change {
            self.change.entry(*kind).or_default().add(config);
        }
        self.notifications_summary.add(&other.notifications_summary);
        self.action_summary.merge(&other.action_summary);
    }
}

pub fn convert_to_summary(rec: &Recommendation, workload_name: &str) -> RecommendationSummary {
    RecommendationSummary::from_recommendation(rec, workload_name)
}

pub fn merge_summaries(a: &RecommendationSummary, b: &RecommendationSummary) -> RecommendationSummary {
    let mut merged = a.clone();
    merged.merge(b);
    merged
}
