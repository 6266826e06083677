//! Stored recommendation listing

use anyhow::Result;
use engine_lib::RecommendationFilter;

use crate::client::ApiClient;
use crate::output::{print_json, print_table, print_warning, recommendation_rows, OutputFormat};

pub async fn list_recommendations(
    client: &ApiClient,
    filter: RecommendationFilter,
    format: OutputFormat,
) -> Result<()> {
    let workloads = client.recommendations(&filter).await?;

    match format {
        OutputFormat::Json => print_json(&workloads)?,
        OutputFormat::Table => {
            if workloads.is_empty() {
                print_warning("No recommendations found");
                return Ok(());
            }
            let rows = recommendation_rows(&workloads);
            let count = rows.len();
            print_table(rows);
            println!("\nTotal: {} workloads, {} rows", workloads.len(), count);
        }
    }

    Ok(())
}
