//! Merge and rollup properties
//!
//! Amounts are dyadic fractions so float sums are exact and results can be
//! compared with `==` regardless of fold order.

#[cfg(test)]
mod merge_tests {
    use crate::models::*;
    use crate::notification::{ActionBucket, ActionResource, NotificationCode};
    use crate::summary::{convert_to_summary, merge_summaries, RecommendationSummary};
    use chrono::{TimeZone, Utc};

    pub(super) fn rec(cpu: f64, memory: f64, codes: &[NotificationCode]) -> Recommendation {
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut config = RecommendationConfig::new();
        config.set(ResourceSetting::Requests, ResourceKind::Cpu, RecommendationConfigItem::new(cpu, "cores"));
        config.set(ResourceSetting::Requests, ResourceKind::Memory, RecommendationConfigItem::new(memory, "MiB"));
        config.set(ResourceSetting::Limits, ResourceKind::Cpu, RecommendationConfigItem::new(cpu * 2.0, "cores"));
        let mut variation = RecommendationConfig::new();
        variation.set(ResourceSetting::Requests, ResourceKind::Cpu, RecommendationConfigItem::new(cpu - 1.0, "cores"));

        let mut rec = Recommendation {
            monitoring_start_time: Some(end - chrono::Duration::days(1)),
            monitoring_end_time: end,
            duration_in_hours: 24.0,
            config: Some(config),
            current_config: None,
            variation: Some(variation),
            notifications: Default::default(),
        };
        for code in codes {
            rec.notify(*code);
        }
        rec
    }

    fn samples() -> Vec<RecommendationSummary> {
        vec![
            convert_to_summary(&rec(0.5, 256.0, &[]), "api"),
            convert_to_summary(&rec(1.25, 0.0, &[NotificationCode::CriticalCpuRequestNotSet]), "worker"),
            convert_to_summary(&rec(2.0, 1024.0, &[NotificationCode::NoticeCpuRecordsAreIdle]), "api"),
            convert_to_summary(&rec(0.0, 0.0, &[NotificationCode::InfoNotEnoughData]), "batch"),
        ]
    }

    #[test]
    fn test_merge_is_commutative() {
        let s = samples();
        for a in &s {
            for b in &s {
                assert_eq!(merge_summaries(a, b), merge_summaries(b, a));
            }
        }
    }

    #[test]
    fn test_merge_is_associative() {
        let s = samples();
        for a in &s {
            for b in &s {
                for c in &s {
                    let left = merge_summaries(&merge_summaries(a, b), c);
                    let right = merge_summaries(a, &merge_summaries(b, c));
                    assert_eq!(left, right);
                }
            }
        }
    }

    #[test]
    fn test_total_is_union_not_sum() {
        let merged = samples()
            .iter()
            .fold(RecommendationSummary::default(), |acc, s| merge_summaries(&acc, s));
        let actions = &merged.action_summary;

        for resource in [ActionResource::Cpu, ActionResource::Memory, ActionResource::General] {
            let bucket_sum: usize = [
                ActionBucket::Optimizable,
                ActionBucket::Idle,
                ActionBucket::Optimized,
                ActionBucket::Critical,
                ActionBucket::Error,
                ActionBucket::Info,
            ]
            .iter()
            .map(|b| actions.count(*b, resource))
            .sum();
            assert!(actions.count(ActionBucket::Total, resource) <= bucket_sum);
        }
        // "api" is both optimizable and idle on cpu
        assert_eq!(actions.count(ActionBucket::Total, ActionResource::Cpu), 2);
    }

    #[test]
    fn test_merging_same_workload_twice_does_not_double_count() {
        let s = convert_to_summary(&rec(0.5, 256.0, &[]), "api");
        let merged = merge_summaries(&s, &s);
        assert_eq!(merged.action_summary.count(ActionBucket::Optimizable, ActionResource::Cpu), 1);
        assert_eq!(merged.config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(1.0));
    }
}

#[cfg(test)]
mod rollup_tests {
    use super::merge_tests::rec;
    use crate::models::*;
    use crate::notification::{ActionBucket, ActionResource, NotificationCode};
    use crate::summary::{RollupAggregator, Scope, SummarizeResult};
    use crate::recommendation::RecommendationComputer;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::{BTreeMap, HashMap};

    fn workload(
        cluster: &str,
        namespace: &str,
        name: &str,
        containers: Vec<(&str, Recommendation)>,
    ) -> WorkloadRecommendations {
        workload_at(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(), cluster, namespace, name, containers)
    }

    fn workload_at(
        ts: DateTime<Utc>,
        cluster: &str,
        namespace: &str,
        name: &str,
        containers: Vec<(&str, Recommendation)>,
    ) -> WorkloadRecommendations {
        WorkloadRecommendations {
            cluster_name: cluster.to_string(),
            namespace: namespace.to_string(),
            workload_name: name.to_string(),
            workload_type: "deployment".to_string(),
            containers: containers
                .into_iter()
                .map(|(container, rec)| {
                    let mut periods = BTreeMap::new();
                    periods.insert("short_term".to_string(), rec);
                    let mut categories = BTreeMap::new();
                    categories.insert(DURATION_BASED.to_string(), periods);
                    let mut tree = RecommendationTree::new();
                    tree.insert(ts, categories);
                    ContainerRecommendations {
                        container_name: container.to_string(),
                        container_image: None,
                        recommendations: tree,
                    }
                })
                .collect(),
        }
    }

    fn fleet() -> Vec<WorkloadRecommendations> {
        vec![
            workload("prod", "default", "api", vec![("app", rec(0.5, 256.0, &[])), ("proxy", rec(0.25, 64.0, &[]))]),
            workload(
                "prod",
                "default",
                "worker",
                vec![("app", rec(1.5, 512.0, &[NotificationCode::CriticalCpuRequestNotSet]))],
            ),
            workload("prod", "jobs", "batch", vec![("runner", rec(0.0, 0.0, &[NotificationCode::InfoNotEnoughData]))]),
            workload("staging", "default", "api", vec![("app", rec(0.75, 128.0, &[]))]),
            workload("prod", "jobs", "cron", Vec::new()),
        ]
    }

    fn slot(result: &SummarizeResult) -> &crate::summary::RecommendationSummary {
        let (_, categories) = result.summary.iter().next().unwrap();
        &categories[DURATION_BASED]["short_term"]
    }

    #[test]
    fn test_two_workload_action_counts() {
        let workloads = vec![
            workload("prod", "default", "api", vec![("app", rec(0.5, 256.0, &[NotificationCode::CriticalCpuRequestNotSet]))]),
            workload("prod", "default", "web", vec![("app", rec(0.5, 256.0, &[]))]),
        ];
        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &workloads);
        let actions = &result.action_summary_top_level;
        assert_eq!(actions.count(ActionBucket::Critical, ActionResource::Cpu), 1);
        assert_eq!(actions.count(ActionBucket::Optimizable, ActionResource::Cpu), 1);
    }

    #[test]
    fn test_cluster_scope_fields() {
        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &fleet());

        assert_eq!(result.cluster_name.as_deref(), Some("prod"));
        assert!(result.namespace_name.is_none());
        let workloads = result.workloads.as_ref().unwrap();
        // workloads without recommendations still count
        assert_eq!(workloads.count, 4);
        assert!(workloads.names.contains("jobs/cron"));
        assert_eq!(result.namespaces.as_ref().unwrap().count, 2);
        assert!(result.clusters.is_none());
        assert!(result.containers.is_none());

        assert_eq!(
            slot(&result).config.amount(ResourceSetting::Requests, ResourceKind::Cpu),
            Some(2.25)
        );
        assert_eq!(result.notifications_summary.critical, 1);
        assert_eq!(result.notifications_summary.info, 1);
        assert_eq!(result.action_summary_top_level.count(ActionBucket::Info, ActionResource::General), 1);
    }

    #[test]
    fn test_namespace_scope_reports_clusters() {
        let result = RollupAggregator::summarize(&Scope::Namespace("default".to_string()), &fleet());
        assert_eq!(result.clusters.as_ref().unwrap().count, 2);
        assert!(result.namespaces.is_none());
        let workloads = result.workloads.as_ref().unwrap();
        assert_eq!(workloads.count, 3);
        assert!(workloads.names.contains("prod/api"));
        assert!(workloads.names.contains("staging/api"));
    }

    #[test]
    fn test_same_name_in_two_clusters_counted_separately_in_actions() {
        let workloads = vec![
            workload("prod", "default", "api", vec![("app", rec(0.5, 256.0, &[]))]),
            workload("staging", "default", "api", vec![("app", rec(0.75, 128.0, &[]))]),
        ];
        let result = RollupAggregator::summarize(&Scope::Namespace("default".to_string()), &workloads);

        let optimizable = result
            .action_summary_top_level
            .get(ActionBucket::Optimizable, ActionResource::Cpu)
            .unwrap();
        assert_eq!(optimizable.count, 2);
        assert!(optimizable.workload_names.contains("staging/api"));
    }

    #[test]
    fn test_cluster_namespace_scope_reports_containers() {
        let scope = Scope::ClusterNamespace {
            cluster: "prod".to_string(),
            namespace: "default".to_string(),
        };
        let result = RollupAggregator::summarize(&scope, &fleet());
        let containers = result.containers.as_ref().unwrap();
        // "app" runs in both api and worker
        assert_eq!(containers.count, 3);
        assert!(containers.names.contains("api/proxy"));
        assert!(containers.names.contains("worker/app"));
        assert!(result.workloads.as_ref().unwrap().names.contains("worker"));
        assert!(result.namespaces.is_none());
        assert!(result.clusters.is_none());
    }

    #[test]
    fn test_out_of_scope_workloads_ignored() {
        let result = RollupAggregator::summarize(&Scope::Cluster("nowhere".to_string()), &fleet());
        assert_eq!(result.workloads.as_ref().unwrap().count, 0);
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_different_as_of_times_merge_into_one_period() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let quarter_past = midnight + Duration::minutes(15);
        let workloads = vec![
            workload_at(midnight, "prod", "default", "api", vec![("app", rec(1.0, 256.0, &[]))]),
            workload_at(quarter_past, "prod", "default", "web", vec![("app", rec(1.0, 128.0, &[]))]),
        ];

        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &workloads);

        assert_eq!(result.summary.len(), 1);
        let (ts, _) = result.summary.iter().next().unwrap();
        assert_eq!(*ts, quarter_past);
        let merged = slot(&result);
        assert_eq!(merged.config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(2.0));
        assert_eq!(merged.config.amount(ResourceSetting::Requests, ResourceKind::Memory), Some(384.0));
    }

    #[test]
    fn test_only_latest_timestamp_of_a_container_contributes() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut api = workload_at(midnight, "prod", "default", "api", vec![("app", rec(1.0, 256.0, &[]))]);
        let older = workload_at(
            midnight - Duration::days(1),
            "prod",
            "default",
            "api",
            vec![("app", rec(4.0, 1024.0, &[NotificationCode::CriticalCpuRequestNotSet]))],
        );
        api.containers[0]
            .recommendations
            .extend(older.containers[0].recommendations.clone());

        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &[api]);

        assert_eq!(result.summary.len(), 1);
        assert_eq!(slot(&result).config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(1.0));
        assert_eq!(result.notifications_summary.critical, 0);
    }

    #[test]
    fn test_computed_workloads_with_staggered_intervals_sum() {
        let computer = RecommendationComputer::new(DurationSubCategory::default_set()).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let metrics = |name: &str, end: DateTime<Utc>| {
            let usage = MetricAggregate {
                sum: Some(1.0),
                avg: Some(1.0),
                max: Some(1.0),
                min: Some(1.0),
                format: Some("cores".to_string()),
            };
            let interval = IntervalResult {
                interval_start: end - Duration::minutes(15),
                interval_end: end,
                duration_in_minutes: 15.0,
                metrics: HashMap::from([(MetricName::CpuUsage, usage)]),
            };
            WorkloadMetrics {
                cluster_name: "prod".to_string(),
                namespace: "default".to_string(),
                workload_name: name.to_string(),
                workload_type: "deployment".to_string(),
                containers: vec![ContainerData::new("app", vec![interval])],
            }
        };
        let workloads = vec![
            computer.compute_workload(&metrics("api", midnight), None),
            computer.compute_workload(&metrics("web", midnight + Duration::minutes(15)), None),
        ];

        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &workloads);

        assert_eq!(result.summary.len(), 1);
        let (_, categories) = result.summary.iter().next().unwrap();
        let short_term = &categories[DURATION_BASED]["short_term"];
        assert_eq!(short_term.config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(2.0));
    }

    #[test]
    fn test_rollup_is_order_independent() {
        let scope = Scope::Cluster("prod".to_string());
        let forward = RollupAggregator::summarize(&scope, &fleet());
        let mut reversed = fleet();
        reversed.reverse();
        assert_eq!(RollupAggregator::summarize(&scope, &reversed), forward);

        let mut rotated = fleet();
        rotated.rotate_left(2);
        assert_eq!(RollupAggregator::summarize(&scope, &rotated), forward);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        for scope in [
            Scope::Cluster("prod".to_string()),
            Scope::Namespace("default".to_string()),
            Scope::ClusterNamespace {
                cluster: "prod".to_string(),
                namespace: "jobs".to_string(),
            },
        ] {
            let sequential = RollupAggregator::summarize(&scope, &fleet());
            let concurrent = RollupAggregator::summarize_concurrent(&scope, fleet())
                .await
                .unwrap();
            assert_eq!(concurrent, sequential, "{}", scope);
        }
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = RollupAggregator::summarize(&Scope::Cluster("prod".to_string()), &fleet());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["clusterName"], "prod");
        assert!(json.get("actionSummaryTopLevel").is_some());
        assert!(json.get("notificationsSummary").is_some());
        assert!(json.get("containers").is_none());
        assert_eq!(json["namespaces"]["count"], 2);
    }
}
