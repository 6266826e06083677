//! Scope summary commands

use anyhow::Result;
use engine_lib::{ActionBucket, ActionResource, SummarizeQuery, SummarizeResult};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_count, color_severity, print_info, print_json, print_table, print_warning,
    resource_label, OutputFormat,
};

const BUCKETS: [ActionBucket; 7] = [
    ActionBucket::Critical,
    ActionBucket::Error,
    ActionBucket::Optimizable,
    ActionBucket::Idle,
    ActionBucket::Optimized,
    ActionBucket::Info,
    ActionBucket::Total,
];

const ACTION_RESOURCES: [ActionResource; 3] = [
    ActionResource::Cpu,
    ActionResource::Memory,
    ActionResource::General,
];

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    bucket: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "General")]
    general: String,
}

pub async fn summarize(
    client: &ApiClient,
    summarize_type: String,
    cluster: Option<String>,
    namespace: Option<String>,
    fetch_fresh: bool,
    format: OutputFormat,
) -> Result<()> {
    let query = SummarizeQuery {
        summarize_type: Some(summarize_type),
        cluster_name: cluster,
        namespace_name: namespace,
        fetch_from_db: fetch_fresh.then(|| "true".to_string()),
    };

    let results = client.summarize(&query).await?;

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => {
            if results.is_empty() {
                print_warning("No data for the requested scope");
                return Ok(());
            }
            for result in &results {
                print_result(result);
            }
        }
    }

    Ok(())
}

fn print_result(result: &SummarizeResult) {
    let scope = match (&result.cluster_name, &result.namespace_name) {
        (Some(cluster), Some(namespace)) => format!("cluster {} / namespace {}", cluster, namespace),
        (Some(cluster), None) => format!("cluster {}", cluster),
        (None, Some(namespace)) => format!("namespace {}", namespace),
        (None, None) => "all workloads".to_string(),
    };
    println!();
    print_info(&scope);

    let mut counts = Vec::new();
    for (label, set) in [
        ("workloads", &result.workloads),
        ("namespaces", &result.namespaces),
        ("clusters", &result.clusters),
        ("containers", &result.containers),
    ] {
        if let Some(set) = set {
            counts.push(format!("{} {}", set.count, label));
        }
    }
    println!("{}", counts.join(", "));

    let severities = &result.notifications_summary;
    println!(
        "{} {}  {} {}  {} {}  {} {}  {} {}",
        color_severity(engine_lib::Severity::Critical),
        severities.critical,
        color_severity(engine_lib::Severity::Error),
        severities.error,
        color_severity(engine_lib::Severity::Warning),
        severities.warning,
        color_severity(engine_lib::Severity::Notice),
        severities.notice,
        color_severity(engine_lib::Severity::Info),
        severities.info,
    );

    let actions = &result.action_summary_top_level;
    let rows: Vec<ActionRow> = BUCKETS
        .iter()
        .map(|&bucket| {
            let cells: Vec<String> = ACTION_RESOURCES
                .iter()
                .map(|&resource| color_count(bucket, actions.count(bucket, resource)))
                .collect();
            ActionRow {
                bucket: bucket.to_string(),
                cpu: cells[0].clone(),
                memory: cells[1].clone(),
                general: cells[2].clone(),
            }
        })
        .collect();
    print_table(rows);

    let critical: Vec<String> = ACTION_RESOURCES
        .iter()
        .filter_map(|&resource| {
            actions
                .get(ActionBucket::Critical, resource)
                .filter(|info| info.count > 0)
                .map(|info| {
                    let names: Vec<&str> = info.workload_names.iter().map(String::as_str).collect();
                    format!("{}: {}", resource_label(resource), names.join(", "))
                })
        })
        .collect();
    if !critical.is_empty() {
        print_warning(&format!("Critical workloads ({})", critical.join("; ")));
    }
}
