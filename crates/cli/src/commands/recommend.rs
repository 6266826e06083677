//! Local recommendation computation from an interval-data file

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use engine_lib::{
    DurationSubCategory, RecommendationComputer, SourceDocument, WorkloadRecommendations,
};
use std::path::Path;

use crate::output::{print_json, print_table, print_warning, recommendation_rows, OutputFormat};

/// Read `metrics` from a workload document and compute recommendations offline
pub fn compute_file(
    path: &Path,
    sub_categories: Option<&str>,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<WorkloadRecommendations>> {
    let sub_categories = match sub_categories {
        Some(list) => DurationSubCategory::parse_list(list).context("Invalid --sub-categories")?,
        None => DurationSubCategory::default_set(),
    };
    let computer = RecommendationComputer::new(sub_categories)?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc: SourceDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let as_of = as_of.or(doc.as_of);
    Ok(doc
        .metrics
        .iter()
        .map(|workload| computer.compute_workload(workload, as_of))
        .collect())
}

pub fn recommend(
    path: &Path,
    sub_categories: Option<String>,
    as_of: Option<DateTime<Utc>>,
    format: OutputFormat,
) -> Result<()> {
    let workloads = compute_file(path, sub_categories.as_deref(), as_of)?;

    match format {
        OutputFormat::Json => print_json(&workloads)?,
        OutputFormat::Table => {
            if workloads.is_empty() {
                print_warning("No workload metrics in file");
                return Ok(());
            }
            print_table(recommendation_rows(&workloads));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_lib::{NotificationCode, ResourceKind, ResourceSetting, DURATION_BASED};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn interval(start: &str, end: &str, cpu: f64, rss_mib: f64) -> serde_json::Value {
        serde_json::json!({
            "intervalStart": start,
            "intervalEnd": end,
            "durationInMinutes": 60.0,
            "metrics": {
                "cpuUsage": {"sum": cpu, "avg": cpu, "max": cpu, "format": "cores"},
                "cpuThrottle": {"sum": 0.0, "avg": 0.0, "max": 0.0, "format": "cores"},
                "memoryUsage": {"sum": rss_mib, "avg": rss_mib, "max": rss_mib, "format": "MiB"},
                "memoryRSS": {"sum": rss_mib, "avg": rss_mib, "max": rss_mib, "format": "MiB"}
            }
        })
    }

    fn document() -> NamedTempFile {
        let doc = serde_json::json!({
            "metrics": [{
                "clusterName": "prod",
                "namespace": "default",
                "workloadName": "api",
                "workloadType": "deployment",
                "containers": [{
                    "containerName": "app",
                    "results": {
                        "2024-03-10T01:00:00Z": interval("2024-03-10T00:00:00Z", "2024-03-10T01:00:00Z", 0.5, 256.0),
                        "2024-03-10T02:00:00Z": interval("2024-03-10T01:00:00Z", "2024-03-10T02:00:00Z", 0.5, 256.0)
                    }
                }]
            }]
        });
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", doc).unwrap();
        file
    }

    #[test]
    fn test_compute_file_uses_requested_sub_categories() {
        let file = document();

        let workloads = compute_file(file.path(), Some("last_day:1,last_week:7"), None).unwrap();

        assert_eq!(workloads.len(), 1);
        let tree = &workloads[0].containers[0].recommendations;
        let periods = &tree.values().next().unwrap()[DURATION_BASED];
        assert_eq!(periods.len(), 2);

        let day = &periods["last_day"];
        let config = day.config.as_ref().unwrap();
        assert_eq!(config.amount(ResourceSetting::Requests, ResourceKind::Cpu), Some(0.5));
        assert!(periods["last_week"].has_notification(NotificationCode::InfoNotEnoughData));
    }

    #[test]
    fn test_compute_file_rejects_bad_sub_categories() {
        let file = document();
        assert!(compute_file(file.path(), Some("weekly"), None).is_err());
    }

    #[test]
    fn test_compute_file_missing_file() {
        let err = compute_file(Path::new("/nonexistent/workloads.json"), None, None).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
