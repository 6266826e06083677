//! Duration-windowed sizing
//!
//! For every configured sub-category the computer selects the intervals
//! inside `[as_of - days, as_of]`, derives requests from the 90th percentile
//! of summed usage and limits from peak usage times the estimated replica
//! count, and attaches the notifications describing the outcome.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use super::stats::{max_value, percentile};
use crate::error::{EngineError, Result};
use crate::models::{
    ContainerData, ContainerRecommendations, DurationSubCategory, IntervalResult, MetricName,
    Recommendation, RecommendationConfig, RecommendationConfigItem, RecommendationTree,
    ResourceKind, ResourceSetting, WorkloadMetrics, WorkloadRecommendations, DURATION_BASED,
};
use crate::notification::NotificationCode;
use crate::observability::EngineMetrics;

/// Percentile used for requests
pub const REQUEST_PERCENTILE: f64 = 90.0;

/// Recommended CPU below this many cores is considered idle
pub const CPU_IDLE_THRESHOLD_CORES: f64 = 0.001;

/// Accepted unit tags per resource
pub const CPU_FORMATS: &[&str] = &["cores", "m"];
pub const MEMORY_FORMATS: &[&str] = &["bytes", "KiB", "MiB", "GiB"];

const OPTIMISED_TOLERANCE: f64 = 1e-9;

/// Metrics describing the currently configured sizing
const CURRENT_METRICS: [(ResourceSetting, ResourceKind, MetricName); 4] = [
    (ResourceSetting::Requests, ResourceKind::Cpu, MetricName::CpuRequest),
    (ResourceSetting::Limits, ResourceKind::Cpu, MetricName::CpuLimit),
    (ResourceSetting::Requests, ResourceKind::Memory, MetricName::MemoryRequest),
    (ResourceSetting::Limits, ResourceKind::Memory, MetricName::MemoryLimit),
];

/// Why a single config item could not be sized
#[derive(Debug, Clone, Copy, PartialEq)]
enum Failure {
    MissingAggregate(MetricName),
    NoReplicaEstimate(MetricName),
    ReplicaEstimate(f64),
    InvalidAmount(f64),
}

impl Failure {
    fn reason(&self) -> String {
        match self {
            Failure::MissingAggregate(metric) => {
                format!("no {:?} aggregate in the window", metric)
            }
            Failure::NoReplicaEstimate(metric) => {
                format!("{:?} average is zero in every interval, cannot divide", metric)
            }
            Failure::ReplicaEstimate(v) => format!("estimated replica count is {}", v),
            Failure::InvalidAmount(v) => format!("computed amount {} is not a valid size", v),
        }
    }

    fn notification(&self, kind: ResourceKind) -> NotificationCode {
        use NotificationCode::*;
        match (self, kind) {
            (Failure::MissingAggregate(_), ResourceKind::Cpu) => ErrorAmountMissingInCpuSection,
            (Failure::MissingAggregate(_), ResourceKind::Memory) => {
                ErrorAmountMissingInMemorySection
            }
            (Failure::InvalidAmount(_), ResourceKind::Cpu) => ErrorInvalidAmountInCpuSection,
            (Failure::InvalidAmount(_), ResourceKind::Memory) => ErrorInvalidAmountInMemorySection,
            (Failure::ReplicaEstimate(v), _) if *v < 0.0 => ErrorNumPodsCannotBeNegative,
            (Failure::ReplicaEstimate(_), _) | (Failure::NoReplicaEstimate(_), _) => {
                ErrorNumPodsCannotBeZero
            }
        }
    }
}

type Sizing = std::result::Result<f64, Failure>;

fn checked(amount: f64) -> Sizing {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(Failure::InvalidAmount(amount))
    }
}

fn item_label(setting: ResourceSetting, kind: ResourceKind) -> &'static str {
    match (setting, kind) {
        (ResourceSetting::Requests, ResourceKind::Cpu) => "requests.cpu",
        (ResourceSetting::Limits, ResourceKind::Cpu) => "limits.cpu",
        (ResourceSetting::Requests, ResourceKind::Memory) => "requests.memory",
        (ResourceSetting::Limits, ResourceKind::Memory) => "limits.memory",
    }
}

fn optimised_code(setting: ResourceSetting, kind: ResourceKind) -> NotificationCode {
    match (setting, kind) {
        (ResourceSetting::Requests, ResourceKind::Cpu) => NotificationCode::NoticeCpuRequestsOptimised,
        (ResourceSetting::Limits, ResourceKind::Cpu) => NotificationCode::NoticeCpuLimitsOptimised,
        (ResourceSetting::Requests, ResourceKind::Memory) => {
            NotificationCode::NoticeMemoryRequestsOptimised
        }
        (ResourceSetting::Limits, ResourceKind::Memory) => NotificationCode::NoticeMemoryLimitsOptimised,
    }
}

/// Intervals selected for one sub-category, in chronological order
struct Window<'a> {
    intervals: Vec<&'a IntervalResult>,
}

impl<'a> Window<'a> {
    fn select(container: &'a ContainerData, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let intervals = container
            .results
            .values()
            .filter(|r| r.interval_start >= start && r.interval_end <= end)
            .collect();
        Self { intervals }
    }

    fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn duration_hours(&self) -> f64 {
        self.intervals
            .iter()
            .map(|r| r.duration_in_minutes)
            .sum::<f64>()
            / 60.0
    }

    /// First non-empty format among `metrics`, scanning oldest to newest
    fn format(&self, metrics: &[MetricName]) -> Option<String> {
        self.intervals.iter().find_map(|r| {
            metrics
                .iter()
                .find_map(|m| r.metric(*m).and_then(|a| a.unit()))
                .map(str::to_string)
        })
    }

    fn usage_sums(&self, metric: MetricName) -> Vec<f64> {
        self.intervals
            .iter()
            .filter_map(|r| r.metric(metric).and_then(|a| a.sum))
            .collect()
    }

    fn cpu_request(&self, p: f64) -> Sizing {
        let values: Vec<f64> = self
            .intervals
            .iter()
            .filter_map(|r| {
                let usage = r.metric(MetricName::CpuUsage)?.sum?;
                let throttle = r
                    .metric(MetricName::CpuThrottle)
                    .and_then(|a| a.sum)
                    .unwrap_or(0.0);
                Some(usage + throttle)
            })
            .collect();
        percentile(p, &values).ok_or(Failure::MissingAggregate(MetricName::CpuUsage))
    }

    fn cpu_limit(&self) -> Sizing {
        let peak = max_value(self.intervals.iter().filter_map(|r| {
            let usage = r.metric(MetricName::CpuUsage)?.max?;
            let throttle = r
                .metric(MetricName::CpuThrottle)
                .and_then(|a| a.max)
                .unwrap_or(0.0);
            Some(usage + throttle)
        }))
        .ok_or(Failure::MissingAggregate(MetricName::CpuUsage))?;
        Ok(peak * self.replica_estimate(MetricName::CpuUsage)?)
    }

    fn memory_request(&self, p: f64) -> Sizing {
        percentile(p, &self.usage_sums(MetricName::MemoryRss))
            .ok_or(Failure::MissingAggregate(MetricName::MemoryRss))
    }

    fn memory_limit(&self) -> Sizing {
        let peak = max_value(
            self.intervals
                .iter()
                .filter_map(|r| r.metric(MetricName::MemoryUsage).and_then(|a| a.max)),
        )
        .ok_or(Failure::MissingAggregate(MetricName::MemoryUsage))?;
        Ok(peak * self.replica_estimate(MetricName::MemoryUsage)?)
    }

    /// Peak concurrent replicas, estimated as `max(sum / avg)`
    fn replica_estimate(&self, metric: MetricName) -> Sizing {
        let pairs: Vec<(f64, f64)> = self
            .intervals
            .iter()
            .filter_map(|r| {
                let agg = r.metric(metric)?;
                Some((agg.sum?, agg.avg?))
            })
            .collect();
        if pairs.is_empty() {
            return Err(Failure::MissingAggregate(metric));
        }
        let estimate = max_value(
            pairs
                .iter()
                .filter(|(_, avg)| *avg != 0.0)
                .map(|(sum, avg)| sum / avg),
        )
        .ok_or(Failure::NoReplicaEstimate(metric))?;
        if estimate <= 0.0 {
            return Err(Failure::ReplicaEstimate(estimate));
        }
        Ok(estimate)
    }

    fn cpu_records_all_zero(&self) -> bool {
        let sums = self.usage_sums(MetricName::CpuUsage);
        !sums.is_empty() && sums.iter().all(|v| *v == 0.0)
    }

    /// Configured sizing taken from the newest interval reporting it
    fn current_config(&self) -> RecommendationConfig {
        let mut current = RecommendationConfig::new();
        for (setting, kind, metric) in CURRENT_METRICS {
            let latest = self
                .intervals
                .iter()
                .rev()
                .find_map(|r| r.metric(metric).filter(|a| a.avg.is_some()));
            if let Some(agg) = latest {
                if let Some(amount) = agg.avg.filter(|v| *v > 0.0) {
                    let format = agg.unit().unwrap_or(kind.default_format());
                    current.set(setting, kind, RecommendationConfigItem::new(amount, format));
                }
            }
        }
        current
    }
}

/// Recommendations for one container at one as-of timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRecommendations {
    pub as_of: DateTime<Utc>,
    /// Sub-category name → recommendation
    pub by_period: BTreeMap<String, Recommendation>,
}

impl ComputedRecommendations {
    pub fn into_tree(self) -> RecommendationTree {
        let mut categories = BTreeMap::new();
        categories.insert(DURATION_BASED.to_string(), self.by_period);
        let mut tree = RecommendationTree::new();
        tree.insert(self.as_of, categories);
        tree
    }
}

/// Computes duration-windowed recommendations
#[derive(Debug, Clone)]
pub struct RecommendationComputer {
    sub_categories: Vec<DurationSubCategory>,
    request_percentile: f64,
    metrics: EngineMetrics,
}

impl RecommendationComputer {
    pub fn new(sub_categories: Vec<DurationSubCategory>) -> Result<Self> {
        if sub_categories.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "at least one duration sub-category is required".to_string(),
            ));
        }
        Ok(Self {
            sub_categories,
            request_percentile: REQUEST_PERCENTILE,
            metrics: EngineMetrics::new(),
        })
    }

    pub fn sub_categories(&self) -> &[DurationSubCategory] {
        &self.sub_categories
    }

    /// Compute one recommendation per sub-category
    ///
    /// `as_of` defaults to the end of the latest interval.
    pub fn compute(
        &self,
        container: &ContainerData,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<ComputedRecommendations> {
        let (Some(latest), Some(earliest)) = (container.latest_end(), container.earliest_start())
        else {
            return Err(EngineError::NoIntervalData(container.container_name.clone()));
        };
        let as_of = as_of.unwrap_or(latest);

        let mut by_period = BTreeMap::new();
        for sub in &self.sub_categories {
            let rec = match self.window_start(sub, as_of, earliest) {
                Ok(start) => {
                    let window = Window::select(container, start, as_of);
                    if window.is_empty() {
                        debug!(
                            container = %container.container_name,
                            sub_category = %sub.name,
                            "No intervals inside window"
                        );
                        Recommendation::not_enough_data(as_of)
                    } else {
                        self.size_window(&window, start, as_of)
                    }
                }
                Err(err) => {
                    debug!(
                        container = %container.container_name,
                        sub_category = %sub.name,
                        error = %err,
                        "Skipping sub-category"
                    );
                    Recommendation::not_enough_data(as_of)
                }
            };
            self.metrics
                .record_recommendation(rec.has_notification(NotificationCode::InfoNotEnoughData));
            by_period.insert(sub.name.clone(), rec);
        }

        Ok(ComputedRecommendations { as_of, by_period })
    }

    /// Compute recommendations for every container of a workload
    ///
    /// Containers without intervals keep their name with an empty tree.
    pub fn compute_workload(
        &self,
        workload: &WorkloadMetrics,
        as_of: Option<DateTime<Utc>>,
    ) -> WorkloadRecommendations {
        let started = Instant::now();
        let containers: Vec<ContainerRecommendations> = workload
            .containers
            .iter()
            .map(|container| {
                let recommendations = match self.compute(container, as_of) {
                    Ok(computed) => computed.into_tree(),
                    Err(err) => {
                        warn!(
                            workload = %workload.workload_name,
                            container = %container.container_name,
                            error = %err,
                            "Recommendation not computed"
                        );
                        RecommendationTree::new()
                    }
                };
                ContainerRecommendations {
                    container_name: container.container_name.clone(),
                    container_image: container.container_image.clone(),
                    recommendations,
                }
            })
            .collect();

        self.metrics
            .observe_recommendation_latency(started.elapsed().as_secs_f64());
        debug!(
            workload = %workload.workload_name,
            containers = containers.len(),
            "Workload recommendations computed"
        );

        WorkloadRecommendations {
            cluster_name: workload.cluster_name.clone(),
            namespace: workload.namespace.clone(),
            workload_name: workload.workload_name.clone(),
            workload_type: workload.workload_type.clone(),
            containers,
        }
    }

    fn window_start(
        &self,
        sub: &DurationSubCategory,
        as_of: DateTime<Utc>,
        earliest: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let start = as_of - Duration::days(i64::from(sub.length_in_days));
        if sub.length_in_days == 1 || start >= earliest {
            Ok(start)
        } else {
            Err(EngineError::InsufficientData {
                sub_category: sub.name.clone(),
                required_days: sub.length_in_days,
            })
        }
    }

    fn size_window(
        &self,
        window: &Window<'_>,
        start: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Recommendation {
        let mut rec = Recommendation {
            monitoring_start_time: Some(start),
            monitoring_end_time: as_of,
            duration_in_hours: window.duration_hours(),
            config: None,
            current_config: None,
            variation: None,
            notifications: BTreeMap::new(),
        };
        if rec.duration_in_hours < 0.0 {
            rec.notify(NotificationCode::ErrorHoursCannotBeNegative);
        }

        let cpu_format = window.format(&[MetricName::CpuUsage, MetricName::CpuThrottle]);
        let memory_format = window.format(&[MetricName::MemoryRss, MetricName::MemoryUsage]);
        check_format(&mut rec, ResourceKind::Cpu, cpu_format.as_deref());
        check_format(&mut rec, ResourceKind::Memory, memory_format.as_deref());

        let current = window.current_config();
        let mut config = RecommendationConfig::new();
        let mut variation = RecommendationConfig::new();

        let outcomes = [
            (ResourceSetting::Requests, ResourceKind::Cpu, window.cpu_request(self.request_percentile), &cpu_format),
            (ResourceSetting::Limits, ResourceKind::Cpu, window.cpu_limit(), &cpu_format),
            (ResourceSetting::Requests, ResourceKind::Memory, window.memory_request(self.request_percentile), &memory_format),
            (ResourceSetting::Limits, ResourceKind::Memory, window.memory_limit(), &memory_format),
        ];

        for (setting, kind, outcome, format) in outcomes {
            match outcome.and_then(checked) {
                Ok(amount) => {
                    config.set(
                        setting,
                        kind,
                        RecommendationConfigItem {
                            amount: Some(amount),
                            format: format.clone(),
                            error_msg: None,
                        },
                    );
                    if let Some(configured) = current.amount(setting, kind) {
                        let delta = amount - configured;
                        variation.set(
                            setting,
                            kind,
                            RecommendationConfigItem {
                                amount: Some(delta),
                                format: format.clone(),
                                error_msg: None,
                            },
                        );
                        if delta.abs() <= OPTIMISED_TOLERANCE {
                            rec.notify(optimised_code(setting, kind));
                        }
                    }
                }
                Err(failure) => {
                    let err = EngineError::MetricComputation {
                        item: item_label(setting, kind).to_string(),
                        reason: failure.reason(),
                    };
                    debug!(error = %err, "Config item not sized");
                    rec.notify(failure.notification(kind));
                    config.set(setting, kind, RecommendationConfigItem::failed(&err, format.clone()));
                }
            }
        }

        let not_set = [
            (ResourceSetting::Requests, ResourceKind::Cpu, NotificationCode::CriticalCpuRequestNotSet),
            (ResourceSetting::Requests, ResourceKind::Memory, NotificationCode::CriticalMemoryRequestNotSet),
            (ResourceSetting::Limits, ResourceKind::Memory, NotificationCode::CriticalMemoryLimitNotSet),
            (ResourceSetting::Limits, ResourceKind::Cpu, NotificationCode::WarningCpuLimitNotSet),
        ];
        for (setting, kind, code) in not_set {
            if current.amount(setting, kind).is_none() {
                rec.notify(code);
            }
        }

        if window.cpu_records_all_zero() {
            rec.notify(NotificationCode::NoticeCpuRecordsAreZero);
        } else if config
            .amount(ResourceSetting::Requests, ResourceKind::Cpu)
            .map(|cpu| cpu < CPU_IDLE_THRESHOLD_CORES)
            .unwrap_or(false)
        {
            rec.notify(NotificationCode::NoticeCpuRecordsAreIdle);
        }

        rec.config = Some(config);
        rec.current_config = Some(current);
        rec.variation = Some(variation);
        rec
    }
}

fn check_format(rec: &mut Recommendation, kind: ResourceKind, format: Option<&str>) {
    let (accepted, missing, invalid) = match kind {
        ResourceKind::Cpu => (
            CPU_FORMATS,
            NotificationCode::ErrorFormatMissingInCpuSection,
            NotificationCode::ErrorInvalidFormatInCpuSection,
        ),
        ResourceKind::Memory => (
            MEMORY_FORMATS,
            NotificationCode::ErrorFormatMissingInMemorySection,
            NotificationCode::ErrorInvalidFormatInMemorySection,
        ),
    };
    match format {
        None => rec.notify(missing),
        Some(f) if !accepted.contains(&f) => rec.notify(invalid),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricAggregate;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn agg(sum: f64, avg: f64, max: f64, format: &str) -> MetricAggregate {
        MetricAggregate {
            sum: Some(sum),
            avg: Some(avg),
            max: Some(max),
            min: Some(0.0),
            format: Some(format.to_string()),
        }
    }

    /// Daily interval `day` (1-based) ending at `base + day days`
    fn daily(day: i64, metrics: Vec<(MetricName, MetricAggregate)>) -> IntervalResult {
        IntervalResult {
            interval_start: base() + Duration::days(day - 1),
            interval_end: base() + Duration::days(day),
            duration_in_minutes: 1440.0,
            metrics: metrics.into_iter().collect::<HashMap<_, _>>(),
        }
    }

    fn ten_days() -> ContainerData {
        ContainerData::new(
            "app",
            (1..=10).map(|day| {
                let v = day as f64;
                daily(
                    day,
                    vec![
                        (MetricName::CpuUsage, agg(v, v / 2.0, v, "cores")),
                        (MetricName::MemoryRss, agg(100.0 * v, 50.0 * v, 100.0 * v, "MiB")),
                        (MetricName::MemoryUsage, agg(200.0 * v, 100.0 * v, 120.0 * v, "MiB")),
                    ],
                )
            }),
        )
    }

    fn computer(subs: &[(&str, u32)]) -> RecommendationComputer {
        RecommendationComputer::new(
            subs.iter()
                .map(|(n, d)| DurationSubCategory::new(*n, *d))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_seven_day_window_request_is_p90() {
        let computed = computer(&[("last-7-day", 7)]).compute(&ten_days(), None).unwrap();
        let rec = &computed.by_period["last-7-day"];
        let config = rec.config.as_ref().unwrap();

        // window holds days 4..=10, round(0.9 * 6) = 5 → 9
        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(9.0));
        assert_eq!(
            config.get(ResourceSetting::Requests, ResourceKind::Cpu).unwrap().format.as_deref(),
            Some("cores")
        );
        assert_eq!(rec.duration_in_hours, 7.0 * 24.0);
        assert_eq!(rec.monitoring_start_time, Some(base() + Duration::days(3)));
        assert_eq!(rec.monitoring_end_time, base() + Duration::days(10));
    }

    #[test]
    fn test_limits_use_peak_times_replica_estimate() {
        let computed = computer(&[("last-7-day", 7)]).compute(&ten_days(), None).unwrap();
        let config = computed.by_period["last-7-day"].config.clone().unwrap();

        // peak cpu max 10, sum/avg = 2
        assert_eq!(config.amount(ResourceSetting::Limits, ResourceKind::Cpu), Some(20.0));
        // rss sums 400..1000, index 5 → 900
        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Memory), Some(900.0));
        // peak usage max 1200, sum/avg = 2
        assert_eq!(config.amount(ResourceSetting::Limits, ResourceKind::Memory), Some(2400.0));
    }

    #[test]
    fn test_limit_peak_and_replica_estimate_come_from_different_intervals() {
        let container = ContainerData::new(
            "app",
            vec![
                // highest max, one replica
                daily(
                    1,
                    vec![
                        (MetricName::CpuUsage, agg(4.0, 4.0, 5.0, "cores")),
                        (MetricName::MemoryUsage, agg(400.0, 400.0, 500.0, "MiB")),
                    ],
                ),
                // lower max, three replicas
                daily(
                    2,
                    vec![
                        (MetricName::CpuUsage, agg(3.0, 1.0, 2.0, "cores")),
                        (MetricName::MemoryUsage, agg(300.0, 100.0, 200.0, "MiB")),
                    ],
                ),
            ],
        );
        let computed = computer(&[("two_days", 2)]).compute(&container, None).unwrap();
        let config = computed.by_period["two_days"].config.clone().unwrap();

        assert_eq!(config.amount(ResourceSetting::Limits, ResourceKind::Cpu), Some(15.0));
        assert_eq!(config.amount(ResourceSetting::Limits, ResourceKind::Memory), Some(1500.0));
    }

    #[test]
    fn test_window_longer_than_history_is_not_enough_data() {
        let computed = computer(&[("last-30-day", 30)]).compute(&ten_days(), None).unwrap();
        let rec = &computed.by_period["last-30-day"];

        assert!(rec.config.is_none());
        assert_eq!(rec.notifications.len(), 1);
        assert!(rec.has_notification(NotificationCode::InfoNotEnoughData));
    }

    #[test]
    fn test_one_day_window_always_satisfiable() {
        let container = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(0.5, 0.5, 0.6, "cores"))])],
        );
        let computed = computer(&[("short_term", 1), ("medium_term", 7)])
            .compute(&container, None)
            .unwrap();

        let short = &computed.by_period["short_term"];
        assert_eq!(
            short.config.as_ref().unwrap().amount(ResourceSetting::Requests, ResourceKind::Cpu),
            Some(0.5)
        );
        assert!(computed.by_period["medium_term"].has_notification(NotificationCode::InfoNotEnoughData));
    }

    #[test]
    fn test_full_history_window_is_satisfiable() {
        let computed = computer(&[("last-10-day", 10)]).compute(&ten_days(), None).unwrap();
        let rec = &computed.by_period["last-10-day"];
        assert!(rec.config.is_some());
        assert_eq!(rec.duration_in_hours, 240.0);
    }

    #[test]
    fn test_throttle_adds_to_cpu_request() {
        let container = ContainerData::new(
            "app",
            vec![daily(
                1,
                vec![
                    (MetricName::CpuUsage, agg(1.0, 0.5, 0.8, "cores")),
                    (MetricName::CpuThrottle, agg(0.25, 0.125, 0.2, "cores")),
                ],
            )],
        );
        let computed = computer(&[("short_term", 1)]).compute(&container, None).unwrap();
        let config = computed.by_period["short_term"].config.clone().unwrap();
        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(1.25));
        // (0.8 + 0.2) * 2
        assert_eq!(config.amount(ResourceSetting::Limits, ResourceKind::Cpu), Some(2.0));
    }

    #[test]
    fn test_missing_memory_does_not_abort_cpu() {
        let container = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(1.0, 0.5, 1.0, "cores"))])],
        );
        let computed = computer(&[("short_term", 1)]).compute(&container, None).unwrap();
        let rec = &computed.by_period["short_term"];
        let config = rec.config.as_ref().unwrap();

        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(1.0));
        let memory = config.get(ResourceSetting::Requests, ResourceKind::Memory).unwrap();
        assert!(memory.amount.is_none());
        assert!(memory.error_msg.as_deref().unwrap().contains("requests.memory"));
        assert!(rec.has_notification(NotificationCode::ErrorAmountMissingInMemorySection));
        assert!(rec.has_notification(NotificationCode::ErrorFormatMissingInMemorySection));
        assert!(!rec.has_notification(NotificationCode::ErrorAmountMissingInCpuSection));
    }

    #[test]
    fn test_zero_average_fails_only_the_limit() {
        let container = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(1.0, 0.0, 1.0, "cores"))])],
        );
        let computed = computer(&[("short_term", 1)]).compute(&container, None).unwrap();
        let rec = &computed.by_period["short_term"];
        let config = rec.config.as_ref().unwrap();

        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(1.0));
        assert!(config.get(ResourceSetting::Limits, ResourceKind::Cpu).unwrap().is_error());
        assert!(rec.has_notification(NotificationCode::ErrorNumPodsCannotBeZero));
    }

    #[test]
    fn test_current_config_drives_variation_and_notices() {
        let mut interval = daily(1, vec![(MetricName::CpuUsage, agg(0.5, 0.5, 0.5, "cores"))]);
        interval
            .metrics
            .insert(MetricName::CpuRequest, agg(0.5, 0.5, 0.5, "cores"));
        interval
            .metrics
            .insert(MetricName::MemoryRequest, agg(512.0, 512.0, 512.0, "MiB"));
        let container = ContainerData::new("app", vec![interval]);

        let computed = computer(&[("short_term", 1)]).compute(&container, None).unwrap();
        let rec = &computed.by_period["short_term"];

        assert!(rec.has_notification(NotificationCode::NoticeCpuRequestsOptimised));
        assert!(rec.has_notification(NotificationCode::WarningCpuLimitNotSet));
        assert!(rec.has_notification(NotificationCode::CriticalMemoryLimitNotSet));
        assert!(!rec.has_notification(NotificationCode::CriticalCpuRequestNotSet));
        assert!(!rec.has_notification(NotificationCode::CriticalMemoryRequestNotSet));

        let variation = rec.variation.as_ref().unwrap();
        assert_eq!(variation.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(0.0));
        assert_eq!(
            rec.current_config.as_ref().unwrap().amount(ResourceSetting::Requests, ResourceKind::Memory),
            Some(512.0)
        );
    }

    #[test]
    fn test_idle_and_zero_cpu_notices() {
        let idle = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(0.0005, 0.0005, 0.0005, "cores"))])],
        );
        let zero = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(0.0, 0.0, 0.0, "cores"))])],
        );
        let c = computer(&[("short_term", 1)]);

        let idle = c.compute(&idle, None).unwrap();
        assert!(idle.by_period["short_term"].has_notification(NotificationCode::NoticeCpuRecordsAreIdle));

        let zero = c.compute(&zero, None).unwrap();
        let zero_rec = &zero.by_period["short_term"];
        assert!(zero_rec.has_notification(NotificationCode::NoticeCpuRecordsAreZero));
        assert!(!zero_rec.has_notification(NotificationCode::NoticeCpuRecordsAreIdle));
    }

    #[test]
    fn test_invalid_format_flagged() {
        let container = ContainerData::new(
            "app",
            vec![daily(1, vec![(MetricName::CpuUsage, agg(1.0, 1.0, 1.0, "furlongs"))])],
        );
        let computed = computer(&[("short_term", 1)]).compute(&container, None).unwrap();
        assert!(computed.by_period["short_term"].has_notification(NotificationCode::ErrorInvalidFormatInCpuSection));
    }

    #[test]
    fn test_explicit_as_of_narrows_window() {
        let as_of = base() + Duration::days(5);
        let computed = computer(&[("short_term", 1)]).compute(&ten_days(), Some(as_of)).unwrap();
        assert_eq!(computed.as_of, as_of);
        let config = computed.by_period["short_term"].config.clone().unwrap();
        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(5.0));
    }

    #[test]
    fn test_empty_container_is_an_error() {
        let empty = ContainerData::new("app", Vec::new());
        assert_eq!(
            computer(&[("short_term", 1)]).compute(&empty, None),
            Err(EngineError::NoIntervalData("app".to_string()))
        );
    }

    #[test]
    fn test_empty_sub_categories_rejected() {
        assert!(RecommendationComputer::new(Vec::new()).is_err());
    }

    #[test]
    fn test_compute_workload_keeps_failed_containers() {
        let workload = WorkloadMetrics {
            cluster_name: "c1".to_string(),
            namespace: "ns".to_string(),
            workload_name: "api".to_string(),
            workload_type: "deployment".to_string(),
            containers: vec![ten_days(), ContainerData::new("sidecar", Vec::new())],
        };
        let recs = computer(&[("short_term", 1)]).compute_workload(&workload, None);
        assert_eq!(recs.containers.len(), 2);
        assert_eq!(recs.containers[0].entries().count(), 1);
        assert_eq!(recs.containers[1].entries().count(), 0);
    }
}
