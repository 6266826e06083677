//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use engine_lib::{
    ActionBucket, ActionResource, Recommendation, RecommendationConfigItem, ResourceKind,
    ResourceSetting, Severity, WorkloadRecommendations,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format bytes as a human-readable string
pub fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes >= GB {
        format!("{:.2}Gi", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes / KB)
    } else {
        format!("{:.0}B", bytes)
    }
}

/// Format a CPU amount in cores as cores or millicores
pub fn format_cores(cores: f64) -> String {
    if cores >= 1.0 {
        format!("{:.2}", cores)
    } else {
        format!("{:.0}m", cores * 1000.0)
    }
}

/// Render one recommended amount in its own unit
pub fn format_item(item: Option<&RecommendationConfigItem>) -> String {
    let Some(item) = item else {
        return "-".to_string();
    };
    if item.is_error() {
        return "error".red().to_string();
    }
    match (item.amount, item.format.as_deref()) {
        (None, _) => "-".to_string(),
        (Some(amount), Some("cores")) => format_cores(amount),
        (Some(amount), Some("bytes")) => format_bytes(amount),
        (Some(amount), Some(unit)) => format!("{:.2}{}", amount, unit),
        (Some(amount), None) => format!("{:.2}", amount),
    }
}

pub fn color_severity(severity: Severity) -> String {
    let text = severity.to_string();
    match severity {
        Severity::Critical | Severity::Error => text.red().bold().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Notice => text.blue().to_string(),
        Severity::Info => text,
    }
}

pub fn color_count(bucket: ActionBucket, count: usize) -> String {
    let text = count.to_string();
    if count == 0 {
        return text;
    }
    match bucket {
        ActionBucket::Critical | ActionBucket::Error => text.red().bold().to_string(),
        ActionBucket::Optimizable => text.yellow().to_string(),
        ActionBucket::Idle => text.blue().to_string(),
        ActionBucket::Optimized => text.green().to_string(),
        ActionBucket::Info | ActionBucket::Total => text,
    }
}

pub fn resource_label(resource: ActionResource) -> &'static str {
    match resource {
        ActionResource::Cpu => "cpu",
        ActionResource::Memory => "memory",
        ActionResource::General => "general",
    }
}

/// Row for recommendation tables
#[derive(Tabled)]
pub struct RecommendationRow {
    #[tabled(rename = "Cluster")]
    pub cluster: String,
    #[tabled(rename = "Namespace")]
    pub namespace: String,
    #[tabled(rename = "Workload")]
    pub workload: String,
    #[tabled(rename = "Container")]
    pub container: String,
    #[tabled(rename = "Period")]
    pub period: String,
    #[tabled(rename = "CPU Req")]
    pub cpu_request: String,
    #[tabled(rename = "CPU Lim")]
    pub cpu_limit: String,
    #[tabled(rename = "Mem Req")]
    pub memory_request: String,
    #[tabled(rename = "Mem Lim")]
    pub memory_limit: String,
    #[tabled(rename = "Notifications")]
    pub notifications: String,
}

/// One row per container and period of the latest recommendation timestamp
pub fn recommendation_rows(workloads: &[WorkloadRecommendations]) -> Vec<RecommendationRow> {
    let mut rows = Vec::new();
    for workload in workloads {
        for container in &workload.containers {
            let Some((_, categories)) = container.recommendations.iter().next_back() else {
                rows.push(RecommendationRow {
                    cluster: workload.cluster_name.clone(),
                    namespace: workload.namespace.clone(),
                    workload: workload.workload_name.clone(),
                    container: container.container_name.clone(),
                    period: "-".to_string(),
                    cpu_request: "-".to_string(),
                    cpu_limit: "-".to_string(),
                    memory_request: "-".to_string(),
                    memory_limit: "-".to_string(),
                    notifications: "no data".yellow().to_string(),
                });
                continue;
            };
            for periods in categories.values() {
                for (period, rec) in periods {
                    rows.push(RecommendationRow {
                        cluster: workload.cluster_name.clone(),
                        namespace: workload.namespace.clone(),
                        workload: workload.workload_name.clone(),
                        container: container.container_name.clone(),
                        period: period.clone(),
                        cpu_request: config_cell(rec, ResourceSetting::Requests, ResourceKind::Cpu),
                        cpu_limit: config_cell(rec, ResourceSetting::Limits, ResourceKind::Cpu),
                        memory_request: config_cell(
                            rec,
                            ResourceSetting::Requests,
                            ResourceKind::Memory,
                        ),
                        memory_limit: config_cell(rec, ResourceSetting::Limits, ResourceKind::Memory),
                        notifications: notification_cell(rec),
                    });
                }
            }
        }
    }
    rows
}

fn config_cell(rec: &Recommendation, setting: ResourceSetting, kind: ResourceKind) -> String {
    format_item(rec.config.as_ref().and_then(|c| c.get(setting, kind)))
}

fn notification_cell(rec: &Recommendation) -> String {
    rec.notifications
        .values()
        .map(|n| format!("{} {}", color_severity(n.severity), n.code.code()))
        .collect::<Vec<_>>()
        .join(", ")
}
